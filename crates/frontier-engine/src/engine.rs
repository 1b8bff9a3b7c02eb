//! The border economy orchestrator
//!
//! `BorderEconomy` composes the border store, the currency source, the
//! pricing engine, and the progression store into atomic purchase
//! transactions. Every player operation is synchronous and runs on the
//! host's single simulation thread; `&mut self` exclusivity makes each
//! reload-and-mutate sequence one critical section.

use crate::clock::SystemClock;
use crate::error::Result;
use crate::purchase::{PurchaseKind, PurchaseRequest, PurchaseStage};
use crate::result::PurchaseOutcome;
use frontier_core::{
    border_key, BorderState, BorderStore, Clock, CurrencySource, Gateway, Ledger, PlayerId,
    PricingEngine, ProgressionStore, WorldDefaults, WorldId, MULTIPLIERS_KEY,
};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// The currency capability in use: the built-in ledger, or an external
/// provider the host wired in at construction time
enum Wallet {
    Internal(Ledger),
    External(Box<dyn CurrencySource>),
}

impl Wallet {
    fn balance(&mut self, player: PlayerId, now: frontier_core::EpochMs, gateway: &dyn Gateway) -> f64 {
        match self {
            Wallet::Internal(ledger) => ledger.balance(player, now, gateway),
            Wallet::External(source) => source.balance(player),
        }
    }

    fn debit(
        &mut self,
        player: PlayerId,
        amount: f64,
        now: frontier_core::EpochMs,
        gateway: &dyn Gateway,
    ) -> bool {
        match self {
            Wallet::Internal(ledger) => ledger.debit(player, amount, now, gateway),
            Wallet::External(source) => source.debit(player, amount),
        }
    }

    fn credit(&mut self, player: PlayerId, amount: f64, now: frontier_core::EpochMs) -> bool {
        match self {
            Wallet::Internal(ledger) => ledger.credit(player, amount, now),
            Wallet::External(source) => source.credit(player, amount),
        }
    }
}

/// The border economy engine
pub struct BorderEconomy {
    pub(crate) borders: BorderStore,
    pub(crate) pricing: PricingEngine,
    pub(crate) progressions: ProgressionStore,
    wallet: Wallet,
    pub(crate) gateway: Box<dyn Gateway>,
    clock: Rc<dyn Clock>,
    defaults: WorldDefaults,
}

impl BorderEconomy {
    /// Create an engine over a gateway and clock, using the built-in ledger
    pub fn new(gateway: Box<dyn Gateway>, clock: Rc<dyn Clock>) -> Self {
        Self {
            borders: BorderStore::new(),
            pricing: PricingEngine::new(),
            progressions: ProgressionStore::new(),
            wallet: Wallet::Internal(Ledger::new()),
            gateway,
            clock,
            defaults: WorldDefaults::default(),
        }
    }

    /// Create an engine on the system clock
    pub fn with_system_clock(gateway: Box<dyn Gateway>) -> Self {
        Self::new(gateway, Rc::new(SystemClock))
    }

    /// Replace the default-population policy for new worlds
    pub fn with_defaults(mut self, defaults: WorldDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Substitute an external currency provider for the built-in ledger
    pub fn with_currency_source(mut self, source: Box<dyn CurrencySource>) -> Self {
        self.wallet = Wallet::External(source);
        self
    }

    /// Install a pre-built pricing engine (e.g. from loaded config)
    pub fn with_pricing(mut self, pricing: PricingEngine) -> Self {
        self.pricing = pricing;
        self
    }

    /// Current time as seen by the engine
    pub fn now_ms(&self) -> frontier_core::EpochMs {
        self.clock.now_ms()
    }

    /// The persistence gateway the engine writes through
    pub fn gateway(&self) -> &dyn Gateway {
        self.gateway.as_ref()
    }

    // ----- world lifecycle -----

    /// Lazily create border state for a world the host just announced
    pub fn ensure_world(&mut self, world: &WorldId) -> &BorderState {
        let now = self.clock.now_ms();
        self.borders.get_or_create(world, &self.defaults, now)
    }

    /// A world's border state, if it has any
    pub fn border(&self, world: &WorldId) -> Option<&BorderState> {
        self.borders.get(world)
    }

    /// All known world IDs
    pub fn worlds(&self) -> Vec<WorldId> {
        self.borders.world_ids().cloned().collect()
    }

    /// The pricing engine (multiplier configs)
    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    /// The progression store
    pub fn progressions(&self) -> &ProgressionStore {
        &self.progressions
    }

    // ----- currency passthroughs -----

    /// A player's current balance
    pub fn balance(&mut self, player: PlayerId) -> f64 {
        let now = self.clock.now_ms();
        self.wallet.balance(player, now, self.gateway.as_ref())
    }

    /// Credit a player's account (host rewards, admin grants)
    pub fn deposit(&mut self, player: PlayerId, amount: f64) -> bool {
        let now = self.clock.now_ms();
        self.wallet.credit(player, amount, now)
    }

    // ----- purchases -----

    /// Expand a world's border by `blocks`
    pub fn expand(&mut self, player: PlayerId, world: &WorldId, blocks: f64) -> PurchaseOutcome {
        self.purchase(&PurchaseRequest::new(
            player,
            world.clone(),
            PurchaseKind::Expand { blocks },
        ))
    }

    /// Shrink a world's border by `blocks`
    pub fn shrink(&mut self, player: PlayerId, world: &WorldId, blocks: f64) -> PurchaseOutcome {
        self.purchase(&PurchaseRequest::new(
            player,
            world.clone(),
            PurchaseKind::Shrink { blocks },
        ))
    }

    /// Move a world's border speed one step
    pub fn adjust_speed(&mut self, player: PlayerId, world: &WorldId, up: bool) -> PurchaseOutcome {
        self.purchase(&PurchaseRequest::new(
            player,
            world.clone(),
            PurchaseKind::SpeedAdjust { up },
        ))
    }

    /// Move a world's border damage one step; `down` is the usual upgrade
    pub fn adjust_damage(
        &mut self,
        player: PlayerId,
        world: &WorldId,
        down: bool,
    ) -> PurchaseOutcome {
        self.purchase(&PurchaseRequest::new(
            player,
            world.clone(),
            PurchaseKind::DamageAdjust { down },
        ))
    }

    /// Run one purchase transaction: validate, price, pay, apply, advance,
    /// persist. No state is touched until the debit has succeeded; a failed
    /// debit leaves border, progression, and balance exactly as they were.
    pub fn purchase(&mut self, request: &PurchaseRequest) -> PurchaseOutcome {
        let now = self.clock.now_ms();
        let player = request.player;
        let world = &request.world;
        let price_type = request.kind.price_type();

        // Validate
        let Some(border) = self.borders.get(world) else {
            return PurchaseOutcome::rejected("World not found");
        };
        if !border.is_enabled() {
            return PurchaseOutcome::rejected("Border system is disabled for this world");
        }
        let base_cost = match request.kind {
            PurchaseKind::Expand { blocks } => {
                if blocks <= 0.0 {
                    return PurchaseOutcome::rejected("Block count must be positive");
                }
                if !border.can_expand(blocks) {
                    let room =
                        (border.player_max_size().min(border.absolute_max_size()) - border.size())
                            .max(0.0);
                    return PurchaseOutcome::rejected(format!(
                        "Maximum expansion: {:.1} blocks",
                        room
                    ));
                }
                border.expand_cost_for(blocks)
            }
            PurchaseKind::Shrink { blocks } => {
                if blocks <= 0.0 {
                    return PurchaseOutcome::rejected("Block count must be positive");
                }
                if !border.can_shrink(blocks) {
                    let room =
                        (border.size() - border.player_min_size().max(border.absolute_min_size()))
                            .max(0.0);
                    return PurchaseOutcome::rejected(format!("Maximum shrink: {:.1} blocks", room));
                }
                border.shrink_cost_for(blocks)
            }
            PurchaseKind::SpeedAdjust { up } => {
                if !border.is_upgradable() {
                    return PurchaseOutcome::rejected("Upgrades are disabled for this world");
                }
                if !border.can_adjust_speed(up) {
                    return PurchaseOutcome::rejected(if up {
                        format!("Maximum speed: {:.1}", border.player_max_speed())
                    } else {
                        format!("Minimum speed: {:.1}", border.player_min_speed())
                    });
                }
                border.speed_adjust_cost(up)
            }
            PurchaseKind::DamageAdjust { down } => {
                if !border.is_upgradable() {
                    return PurchaseOutcome::rejected("Upgrades are disabled for this world");
                }
                if !border.can_adjust_damage(down) {
                    return PurchaseOutcome::rejected(if down {
                        format!("Minimum damage: {:.1}", border.player_min_damage())
                    } else {
                        format!("Maximum damage: {:.1}", border.player_max_damage())
                    });
                }
                border.damage_adjust_cost(down)
            }
        };

        // Price
        let cost = self.pricing.price_for(
            &mut self.progressions,
            player,
            world,
            price_type,
            base_cost,
            now,
            self.gateway.as_ref(),
        );

        // Pay
        let balance = self.wallet.balance(player, now, self.gateway.as_ref());
        if balance < cost {
            return PurchaseOutcome::rejected(format!(
                "Insufficient funds: need {:.2}, have {:.2}",
                cost, balance
            ));
        }
        if !self.wallet.debit(player, cost, now, self.gateway.as_ref()) {
            return PurchaseOutcome::rejected("Currency withdrawal failed");
        }

        // Apply
        let Some(border) = self.borders.get_mut(world) else {
            // Unreachable in practice: the world was validated above and
            // worlds are never removed. Refund and bail defensively.
            self.wallet.credit(player, cost, now);
            return PurchaseOutcome::rejected("World not found");
        };
        let (message, new_value, change) = match request.kind {
            PurchaseKind::Expand { blocks } => {
                border.set_size(border.size() + blocks, now);
                (
                    format!(
                        "Border expanded by {:.1} blocks. New size: {:.1}",
                        blocks,
                        border.size()
                    ),
                    border.size(),
                    blocks,
                )
            }
            PurchaseKind::Shrink { blocks } => {
                border.set_size(border.size() - blocks, now);
                (
                    format!(
                        "Border shrunk by {:.1} blocks. New size: {:.1}",
                        blocks,
                        border.size()
                    ),
                    border.size(),
                    blocks,
                )
            }
            PurchaseKind::SpeedAdjust { up } => {
                let step = border.upgrade_step_speed();
                let delta = if up { step } else { -step };
                border.set_speed(border.speed() + delta, now);
                (
                    format!(
                        "Speed {} by {:.1}. New speed: {:.1} blocks/sec",
                        if up { "increased" } else { "decreased" },
                        step,
                        border.speed()
                    ),
                    border.speed(),
                    step,
                )
            }
            PurchaseKind::DamageAdjust { down } => {
                let step = border.upgrade_step_damage();
                let delta = if down { -step } else { step };
                border.set_damage(border.damage() + delta, now);
                (
                    format!(
                        "Damage {} by {:.1}. New damage: {:.1} per sec",
                        if down { "decreased" } else { "increased" },
                        step,
                        border.damage()
                    ),
                    border.damage(),
                    step,
                )
            }
        };
        border.record_purchase(price_type, now);
        border.add_spent(cost, now);

        // Advance
        self.progressions.advance(player, world, price_type, cost, now);

        // Persist the border record; the progression store flushes on its
        // own schedule. A write failure never rolls back the purchase.
        let stage = if self.persist_border(world) {
            PurchaseStage::Persisted
        } else {
            PurchaseStage::Applied
        };

        PurchaseOutcome::completed(message, new_value, change, cost, stage)
    }

    /// Sell an item back to the world's shop, crediting the player
    pub fn sell_item(
        &mut self,
        player: PlayerId,
        world: &WorldId,
        item: &str,
        amount: u32,
    ) -> PurchaseOutcome {
        let now = self.clock.now_ms();
        let Some(border) = self.borders.get(world) else {
            return PurchaseOutcome::rejected("World not found");
        };
        if !border.is_shop_enabled() {
            return PurchaseOutcome::rejected("The shop is disabled for this world");
        }
        if amount == 0 {
            return PurchaseOutcome::rejected("Amount must be positive");
        }
        let Some(price) = border.item_price(item) else {
            return PurchaseOutcome::rejected(format!("No price listed for {}", item.to_uppercase()));
        };

        let total = price * amount as f64;
        if !self.wallet.credit(player, total, now) {
            return PurchaseOutcome::rejected("Currency deposit failed");
        }
        if let Some(border) = self.borders.get_mut(world) {
            border.add_earned(total, now);
        }

        let stage = if self.persist_border(world) {
            PurchaseStage::Persisted
        } else {
            PurchaseStage::Applied
        };
        PurchaseOutcome {
            success: true,
            message: format!("Sold {} x {} for {:.2}", amount, item.to_uppercase(), total),
            new_value: None,
            change: None,
            cost: Some(total),
            stage,
        }
    }

    // ----- lifecycle -----

    /// Load borders, multiplier configs, and balances from the gateway.
    /// Returns the number of worlds restored.
    pub fn bootstrap(&mut self) -> Result<usize> {
        let now = self.clock.now_ms();

        let mut count = 0;
        for key in self.gateway.list_keys("border/")? {
            let Some(name) = key.strip_prefix("border/") else {
                continue;
            };
            if let Some(record) = self.gateway.load(&key)? {
                self.borders
                    .insert(BorderState::from_record(WorldId::new(name), &record, now));
                count += 1;
            }
        }

        if let Some(record) = self.gateway.load(MULTIPLIERS_KEY)? {
            self.pricing = PricingEngine::from_record(&record);
        }

        if let Wallet::Internal(ledger) = &mut self.wallet {
            ledger.load_all(self.gateway.as_ref(), now)?;
        }

        info!(worlds = count, "border economy bootstrapped");
        Ok(count)
    }

    /// Write every record the engine owns. Returns the number of records
    /// written; failures are logged and skipped.
    pub fn autosave(&mut self) -> usize {
        let mut written = 0;

        for world in self.worlds() {
            if self.persist_border(&world) {
                written += 1;
            }
        }

        match self.gateway.save(MULTIPLIERS_KEY, &self.pricing.to_record()) {
            Ok(()) => written += 1,
            Err(err) => warn!(%err, "failed to persist multiplier configs"),
        }

        if let Wallet::Internal(ledger) = &mut self.wallet {
            if let Err(err) = ledger.flush(self.gateway.as_ref()) {
                warn!(%err, "failed to flush balances");
            }
        }
        if let Err(err) = self.progressions.flush_all(self.gateway.as_ref()) {
            warn!(%err, "failed to flush progressions");
        }

        debug!(records = written, "autosave complete");
        written
    }

    /// Background maintenance: flush-then-evict cache entries older than
    /// the staleness window. The host calls this on its own timer.
    pub fn maintain(&mut self) {
        let now = self.clock.now_ms();
        if let Wallet::Internal(ledger) = &mut self.wallet {
            if let Err(err) = ledger.sweep(now, self.gateway.as_ref()) {
                warn!(%err, "balance cache sweep failed");
            }
        }
        if let Err(err) = self.progressions.sweep(now, self.gateway.as_ref()) {
            warn!(%err, "progression cache sweep failed");
        }
        debug!("cache maintenance complete");
    }

    /// Write one world's border record. Returns false (after logging) on
    /// failure; the in-memory state stands either way.
    pub(crate) fn persist_border(&self, world: &WorldId) -> bool {
        let Some(border) = self.borders.get(world) else {
            return false;
        };
        match self.gateway.save(&border_key(world), &border.to_record()) {
            Ok(()) => true,
            Err(err) => {
                warn!(world = %world, %err, "failed to persist border state");
                false
            }
        }
    }

    /// Write the multiplier-config record. Returns false (after logging) on
    /// failure.
    pub(crate) fn persist_multipliers(&self) -> bool {
        match self.gateway.save(MULTIPLIERS_KEY, &self.pricing.to_record()) {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "failed to persist multiplier configs");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::{Bound, Metric};
    use frontier_core::{
        FormulaKind, FixedClock, MemoryGateway, MultiplierConfig, PriceType, ResetSchedule,
    };

    fn setup() -> (BorderEconomy, Rc<MemoryGateway>, Rc<FixedClock>) {
        let gateway = Rc::new(MemoryGateway::new());
        let clock = Rc::new(FixedClock::at(1_000));
        let engine = BorderEconomy::new(Box::new(Rc::clone(&gateway)), clock.clone());
        (engine, gateway, clock)
    }

    fn linear_expand_config() -> MultiplierConfig {
        let mut config = MultiplierConfig::new(PriceType::Expand);
        config.set_kind(FormulaKind::Linear);
        config.set_base_value(1.0);
        config.set_step(0.01);
        config
    }

    #[test]
    fn test_expand_at_level_zero() {
        let (mut engine, _, _) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.set_multiplier_config(linear_expand_config());
        engine.deposit(player, 500.0);

        let outcome = engine.expand(player, &world, 100.0);
        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.cost, Some(100.0));
        assert_eq!(outcome.new_value, Some(1_100.0));
        assert_eq!(outcome.stage, PurchaseStage::Persisted);

        assert_eq!(engine.border(&world).unwrap().size(), 1_100.0);
        assert_eq!(
            engine.progressions().level(player, &world, PriceType::Expand),
            1
        );
        assert_eq!(engine.balance(player), 400.0);
    }

    #[test]
    fn test_progressive_price_climbs_with_level() {
        let (mut engine, _, _) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.set_multiplier_config(linear_expand_config());
        engine.deposit(player, 10_000.0);

        let first = engine.expand(player, &world, 100.0);
        let second = engine.expand(player, &world, 100.0);
        let third = engine.expand(player, &world, 100.0);

        assert_eq!(first.cost, Some(100.0));
        assert!((second.cost.unwrap() - 101.0).abs() < 1e-9); // level 1 -> x1.01
        assert!((third.cost.unwrap() - 102.0).abs() < 1e-9); // level 2 -> x1.02
    }

    #[test]
    fn test_insufficient_funds_mutates_nothing() {
        let (mut engine, gateway, _) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.deposit(player, 50.0);

        let border_before = engine.border(&world).unwrap().to_record();
        let progression_before = engine.progressions().to_record(player);

        let outcome = engine.expand(player, &world, 100.0);
        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Insufficient funds"));
        assert_eq!(outcome.stage, PurchaseStage::Rejected);

        assert_eq!(engine.border(&world).unwrap().to_record(), border_before);
        assert_eq!(engine.progressions().to_record(player), progression_before);
        assert_eq!(engine.balance(player), 50.0);
        // Nothing was persisted either
        assert!(gateway.load("border/overworld").unwrap().is_none());
    }

    #[test]
    fn test_shrink_below_player_min_rejected() {
        let (mut engine, _, _) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.deposit(player, 10_000.0);

        // Player min size defaults to 50; shrinking 960 would land at 40
        let outcome = engine.shrink(player, &world, 960.0);
        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Maximum shrink"));
        assert_eq!(engine.border(&world).unwrap().size(), 1_000.0);
        assert_eq!(
            engine.progressions().level(player, &world, PriceType::Shrink),
            0
        );
    }

    #[test]
    fn test_expand_beyond_player_max_rejected() {
        let (mut engine, _, _) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.deposit(player, 1_000_000.0);

        let outcome = engine.expand(player, &world, 40_000.0);
        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Maximum expansion"));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let (mut engine, _, _) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.deposit(player, 100.0);

        assert!(!engine.expand(player, &world, 0.0).success);
        assert!(!engine.expand(player, &world, -5.0).success);
        assert!(!engine.shrink(player, &world, 0.0).success);
    }

    #[test]
    fn test_unknown_world_rejected() {
        let (mut engine, _, _) = setup();
        let outcome = engine.expand(PlayerId::new(1), &WorldId::new("void"), 10.0);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "World not found");
    }

    #[test]
    fn test_disabled_world_rejected() {
        let (mut engine, _, _) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.set_enabled(&world, false).unwrap();
        engine.deposit(player, 1_000.0);

        let outcome = engine.expand(player, &world, 10.0);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Border system is disabled for this world");
    }

    #[test]
    fn test_speed_adjust_steps_and_costs() {
        let (mut engine, _, _) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.deposit(player, 100.0);

        let outcome = engine.adjust_speed(player, &world, true);
        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.cost, Some(15.0));
        assert!((outcome.new_value.unwrap() - 1.1).abs() < 1e-9);

        let outcome = engine.adjust_speed(player, &world, false);
        assert!(outcome.success);
        assert_eq!(outcome.cost, Some(5.0));
        assert!((outcome.new_value.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_damage_adjust_respects_bounds() {
        let (mut engine, _, _) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.deposit(player, 10_000.0);

        // One step above the player minimum of 0.5: one downward step fits,
        // the next would cross the bound
        let now = engine.now_ms();
        engine
            .borders
            .get_mut(&world)
            .unwrap()
            .set_damage(0.65, now);

        let outcome = engine.adjust_damage(player, &world, true);
        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.cost, Some(12.0));

        let outcome = engine.adjust_damage(player, &world, true);
        assert!(!outcome.success);
        assert!(outcome.message.starts_with("Minimum damage"));

        // Upward steps still work and bill the damage-up price
        let outcome = engine.adjust_damage(player, &world, false);
        assert!(outcome.success);
        assert_eq!(outcome.cost, Some(8.0));
    }

    #[test]
    fn test_not_upgradable_blocks_speed_and_damage_only() {
        let (mut engine, _, _) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.set_upgradable(&world, false).unwrap();
        engine.deposit(player, 1_000.0);

        assert!(!engine.adjust_speed(player, &world, true).success);
        assert!(!engine.adjust_damage(player, &world, true).success);
        assert!(engine.expand(player, &world, 10.0).success);
    }

    #[test]
    fn test_daily_reset_returns_to_level_zero_price() {
        let (mut engine, _, clock) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        let mut config = linear_expand_config();
        config.set_step(0.5);
        config.set_reset_schedule(ResetSchedule::Daily);
        engine.set_multiplier_config(config);
        engine.deposit(player, 10_000.0);

        assert_eq!(engine.expand(player, &world, 100.0).cost, Some(100.0));
        assert_eq!(engine.expand(player, &world, 100.0).cost, Some(150.0));

        // More than 24 hours later the level is reset before pricing
        clock.advance(90_000_000);
        assert_eq!(engine.expand(player, &world, 100.0).cost, Some(100.0));
        assert_eq!(
            engine.progressions().level(player, &world, PriceType::Expand),
            1
        );
    }

    #[test]
    fn test_sell_item_credits_player_and_world_earnings() {
        let (mut engine, _, _) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.set_item_price(&world, "diamond", 64.0).unwrap();

        let outcome = engine.sell_item(player, &world, "diamond", 3);
        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.cost, Some(192.0));
        assert_eq!(engine.balance(player), 192.0);
        assert_eq!(engine.border(&world).unwrap().total_earned(), 192.0);

        assert!(!engine.sell_item(player, &world, "dirt", 1).success);
        engine.set_shop_enabled(&world, false).unwrap();
        assert!(!engine.sell_item(player, &world, "diamond", 1).success);
    }

    #[test]
    fn test_admin_limits_validate_and_persist() {
        let (mut engine, gateway, _) = setup();
        let world = WorldId::new("overworld");
        engine.ensure_world(&world);

        // Out of the hard admin range
        assert!(engine
            .set_absolute_limit(&world, Metric::Size, Bound::Max, 2_000_000.0)
            .is_err());

        let applied = engine
            .set_absolute_limit(&world, Metric::Size, Bound::Max, 5_000.0)
            .unwrap();
        assert_eq!(applied, 5_000.0);
        // Player max was pulled inward
        assert_eq!(engine.border(&world).unwrap().player_max_size(), 5_000.0);

        // Player limit must lie inside the absolute range
        assert!(engine
            .set_player_limit(&world, Metric::Size, Bound::Max, 9_000.0)
            .is_err());
        let applied = engine
            .set_player_limit(&world, Metric::Size, Bound::Max, 3_000.0)
            .unwrap();
        assert_eq!(applied, 3_000.0);

        let record = gateway.load("border/overworld").unwrap().unwrap();
        assert_eq!(
            record.get("playerMaxSize"),
            Some(&frontier_core::Value::Float(3_000.0))
        );
    }

    #[test]
    fn test_admin_base_price_feeds_purchases() {
        let (mut engine, _, _) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.deposit(player, 1_000.0);

        engine.set_base_price(&world, PriceType::Expand, 2.0).unwrap();
        let outcome = engine.expand(player, &world, 100.0);
        assert_eq!(outcome.cost, Some(200.0));
    }

    #[test]
    fn test_reset_progress() {
        let (mut engine, _, _) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.set_multiplier_config(linear_expand_config());
        engine.deposit(player, 10_000.0);

        engine.expand(player, &world, 10.0);
        engine.expand(player, &world, 10.0);
        assert_eq!(
            engine.progressions().level(player, &world, PriceType::Expand),
            2
        );

        assert!(engine.reset_progress(player, &world, PriceType::Expand));
        assert_eq!(
            engine.progressions().level(player, &world, PriceType::Expand),
            0
        );
        assert!(!engine.reset_progress(player, &world, PriceType::SpeedUp));
    }

    #[test]
    fn test_external_currency_source() {
        struct TestWallet {
            balance: f64,
        }
        impl CurrencySource for TestWallet {
            fn balance(&mut self, _player: PlayerId) -> f64 {
                self.balance
            }
            fn debit(&mut self, _player: PlayerId, amount: f64) -> bool {
                if amount <= 0.0 || self.balance < amount {
                    return false;
                }
                self.balance -= amount;
                true
            }
            fn credit(&mut self, _player: PlayerId, amount: f64) -> bool {
                if amount <= 0.0 {
                    return false;
                }
                self.balance += amount;
                true
            }
        }

        let gateway = Rc::new(MemoryGateway::new());
        let clock = Rc::new(FixedClock::at(1_000));
        let mut engine = BorderEconomy::new(Box::new(Rc::clone(&gateway)), clock)
            .with_currency_source(Box::new(TestWallet { balance: 150.0 }));
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);

        assert!(engine.expand(player, &world, 100.0).success);
        assert_eq!(engine.balance(player), 50.0);
        assert!(!engine.expand(player, &world, 100.0).success);
    }

    #[test]
    fn test_autosave_and_bootstrap_round_trip() {
        let gateway = Rc::new(MemoryGateway::new());
        let clock = Rc::new(FixedClock::at(1_000));

        let mut engine =
            BorderEconomy::new(Box::new(Rc::clone(&gateway)), clock.clone());
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.set_multiplier_config(linear_expand_config());
        engine.deposit(player, 1_000.0);
        engine.expand(player, &world, 250.0);
        engine.autosave();

        let mut restored = BorderEconomy::new(Box::new(Rc::clone(&gateway)), clock);
        let worlds = restored.bootstrap().unwrap();
        assert_eq!(worlds, 1);
        assert_eq!(restored.border(&world).unwrap().size(), 1_250.0);
        assert_eq!(restored.balance(player), 750.0);
        assert_eq!(
            restored
                .pricing()
                .config(PriceType::Expand)
                .unwrap()
                .kind(),
            FormulaKind::Linear
        );

        // Progression reloads lazily on the next priced purchase
        let outcome = restored.expand(player, &world, 100.0);
        assert!(outcome.success);
        assert!((outcome.cost.unwrap() - 101.0).abs() < 1e-9); // level 1 -> x1.01
    }

    #[test]
    fn test_maintain_flushes_caches() {
        let (mut engine, gateway, clock) = setup();
        let world = WorldId::new("overworld");
        let player = PlayerId::new(1);
        engine.ensure_world(&world);
        engine.deposit(player, 1_000.0);
        engine.expand(player, &world, 10.0);

        clock.advance(frontier_core::CACHE_STALE_MS + 1);
        engine.maintain();

        assert!(gateway.load("balances").unwrap().is_some());
        assert!(gateway.load("progression/1").unwrap().is_some());
    }
}
