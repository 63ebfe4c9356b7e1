//! Inventory Engine and Rule Engine: typed calculation rules applied to
//! positions, contracts and market data to produce availability records,
//! with the three fixed market overlays named in spec.md §4.3.

pub mod calculation_type;
pub mod engine;
pub mod evaluator;
pub mod inventory;
pub mod key;
pub mod overlays;
pub mod rule_input;
pub mod rule_output;
pub mod rules;
pub mod temperature;

pub use calculation_type::CalculationType;
pub use engine::InventoryEngine;
pub use evaluator::{BaseAvailabilityRule, RuleEvaluator};
pub use inventory::Inventory;
pub use key::InventoryKey;
pub use rule_input::RuleInput;
pub use rule_output::RuleOutput;
pub use rules::RuleRegistry;
pub use temperature::SecurityTemperature;
