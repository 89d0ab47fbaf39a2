use anyhow::Context;
use colored::Colorize;
use skyline_cloud::QualifiedName;

pub fn handle(raw: &str, namespace: Option<&str>) -> anyhow::Result<()> {
    let mut name =
        QualifiedName::parse(raw).with_context(|| format!("Cannot resolve '{}'", raw))?;
    if let Some(namespace) = namespace {
        name = name.with_default_namespace(namespace);
    }

    let or_none = |s: &str| if s.is_empty() { "-".dimmed().to_string() } else { s.to_string() };
    println!("{}  {}", "namespace".dimmed(), or_none(name.namespace()));
    println!("{}    {}", "package".dimmed(), or_none(name.package()));
    println!("{}     {}", "entity".dimmed(), name.entity());
    println!("{}  {}", "qualified".dimmed(), name.format().cyan());
    Ok(())
}
