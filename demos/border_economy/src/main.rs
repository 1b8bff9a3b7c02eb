//! Border Economy Example
//!
//! Demonstrates the engine end to end: progressive expansion pricing, an
//! underfunded rejection, a daily level reset, and the sell shop.

use frontier_core::{FixedClock, MemoryGateway, PlayerId, PriceType, WorldId, DAY_MS};
use frontier_engine::BorderEconomy;
use frontier_script::Loader;
use std::rc::Rc;

const CONFIG: &str = r#"
(
    multipliers: [
        (
            price_type: "expand",
            kind: "linear",
            base_value: 1.0,
            step: 0.25,
            limits: Some((min: 1.0, max: 5.0)),
            reset_schedule: "daily",
        ),
    ]
)
"#;

fn main() {
    println!("=== Frontier Border Economy Example ===\n");

    let mut loader = Loader::new();
    loader
        .load_multipliers_str(CONFIG)
        .expect("config should parse");
    let defs = loader.finish();

    let gateway = Rc::new(MemoryGateway::new());
    let clock = Rc::new(FixedClock::at(1_700_000_000_000));
    let mut engine = BorderEconomy::new(Box::new(Rc::clone(&gateway)), clock.clone())
        .with_pricing(defs.pricing_engine());

    let world = WorldId::new("overworld");
    let player = PlayerId::new(1);

    engine.ensure_world(&world);
    engine.deposit(player, 500.0);
    println!(
        "World '{}' starts at size {:.0}; player balance {:.2}\n",
        world,
        engine.border(&world).unwrap().size(),
        engine.balance(player),
    );

    // Each purchase raises the player's level and the next price with it
    println!("Expanding 100 blocks, three times:");
    for _ in 0..3 {
        let outcome = engine.expand(player, &world, 100.0);
        println!(
            "  {} (cost {:.2}, balance {:.2})",
            outcome.message,
            outcome.cost.unwrap_or(0.0),
            engine.balance(player),
        );
    }

    // The fourth would cost 175.00 but only 125.00 is left
    let outcome = engine.expand(player, &world, 100.0);
    println!("\nFourth attempt: {}", outcome.message);
    println!(
        "Size unchanged at {:.0}, level still {}",
        engine.border(&world).unwrap().size(),
        engine.progressions().level(player, &world, PriceType::Expand),
    );

    // A day later the daily schedule resets the level before pricing
    clock.advance(DAY_MS + 1);
    engine.deposit(player, 200.0);
    let outcome = engine.expand(player, &world, 100.0);
    println!("\nNext day: {}", outcome.message);
    println!(
        "Back to the level-0 price: {:.2}",
        outcome.cost.unwrap_or(0.0)
    );

    // Sell something back through the world shop
    engine
        .set_item_price(&world, "diamond", 64.0)
        .expect("world exists");
    let outcome = engine.sell_item(player, &world, "diamond", 2);
    println!("\n{}", outcome.message);
    println!("Final balance: {:.2}", engine.balance(player));

    let saved = engine.autosave();
    println!("\nAutosaved {} records", saved);

    println!("\n=== Walkthrough Complete ===");
}
