use colored::Colorize;
use skyline_cloud::{ResourceState, ResourceStatus};

fn colored_status(status: ResourceStatus) -> colored::ColoredString {
    let text = status.to_string();
    match status {
        ResourceStatus::Active => text.green(),
        ResourceStatus::Provisioning => text.yellow(),
        ResourceStatus::Inactive => text.dimmed(),
        ResourceStatus::Unknown => text.red(),
    }
}

/// Attribute value as shown to the user; strings without quotes
fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn print_state(state: &ResourceState) {
    println!(
        "{} {} ({})",
        state.resource_type.bold(),
        state.id.cyan(),
        colored_status(state.status)
    );
    let width = state.attributes.keys().map(String::len).max().unwrap_or(0);
    for (key, value) in &state.attributes {
        let key = format!("{:width$}", key, width = width);
        println!("  {}  {}", key.dimmed(), display_value(value));
    }
}

pub fn print_deleted(kind: &str, id: &str) {
    println!("{} Deleted {} {}", "✓".green(), kind, id.cyan());
}
