//! List command implementation

use crate::targets;

/// List all supported debug targets and their parameters
pub fn list_targets() {
    println!("Supported targets:");
    println!();

    for target in targets::available_targets() {
        let aliases = if target.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", target.aliases.join(", "))
        };
        println!("  {:10} - {}{}", target.name, target.description, aliases);

        for (key, help) in target.params {
            println!("      {:12} {}", key, help);
        }
    }
}
