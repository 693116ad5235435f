use anyhow::{anyhow, Result};
use colored::*;

use crate::utils::service_config::ServiceConfig;

/// Show the resolved configuration
pub fn show(config: &ServiceConfig, format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        "yaml" => {
            println!("{}", serde_yaml::to_string(config)?);
        }
        _ => {
            println!("{}", "=== Classgate Configuration ===".bold());
            println!();
            match &config.source {
                Some(path) => println!("{}: {}", "Source".bold(), path.display().to_string().green()),
                None => println!("{}: {}", "Source".bold(), "defaults".yellow()),
            }
            println!();
            print_yaml_value(&serde_yaml::to_value(config)?, 0);
        }
    }

    Ok(())
}

/// Print one value of the resolved configuration
pub fn get(config: &ServiceConfig, path: &str, format: &str) -> Result<()> {
    let root = serde_yaml::to_value(config)?;
    let parts: Vec<&str> = path.split('.').collect();
    let value = navigate_config_path(&root, &parts)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        "yaml" => {
            println!("{}", serde_yaml::to_string(&value)?);
        }
        _ => {
            print_config_value(path, &value);
        }
    }

    Ok(())
}

/// Navigate through the configuration structure to find a specific value
fn navigate_config_path(root: &serde_yaml::Value, path: &[&str]) -> Result<serde_yaml::Value> {
    if path.is_empty() || path.iter().any(|p| p.is_empty()) {
        return Err(anyhow!("Empty configuration path"));
    }

    let mut current_value = root.clone();

    for (i, &key) in path.iter().enumerate() {
        match current_value {
            serde_yaml::Value::Mapping(ref map) => {
                current_value = map
                    .get(serde_yaml::Value::String(key.to_string()))
                    .ok_or_else(|| {
                        let partial_path = path[..=i].join(".");
                        anyhow!("Configuration key '{}' not found", partial_path)
                    })?
                    .clone();
            }
            _ => {
                let partial_path = path[..i].join(".");
                return Err(anyhow!(
                    "Cannot navigate further from '{}': not a mapping",
                    partial_path
                ));
            }
        }
    }

    Ok(current_value)
}

/// Print a specific configuration value
fn print_config_value(path: &str, value: &serde_yaml::Value) {
    println!("{}", "=== Configuration Value ===".bold());
    println!();
    println!("{}: {}", "Path".bold(), path.cyan());
    println!("{}: {}", "Type".bold(), value_type_name(value).yellow());
    println!();
    println!("{}:", "Value".bold());
    print_yaml_value(value, 0);
}

/// Get a human-readable name for a YAML value type
fn value_type_name(value: &serde_yaml::Value) -> &str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "boolean",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "array",
        serde_yaml::Value::Mapping(_) => "object",
        serde_yaml::Value::Tagged(_) => "tagged",
    }
}

/// Recursively print a YAML value with indentation
fn print_yaml_value(value: &serde_yaml::Value, indent_level: usize) {
    let indent = "  ".repeat(indent_level);

    match value {
        serde_yaml::Value::Null => {
            println!("{}null", indent);
        }
        serde_yaml::Value::Bool(b) => {
            println!("{}{}", indent, b.to_string().blue());
        }
        serde_yaml::Value::Number(n) => {
            println!("{}{}", indent, n.to_string().magenta());
        }
        serde_yaml::Value::String(s) => {
            // Paths in green
            if s.contains('/') || s.contains('\\') {
                println!("{}{}", indent, s.green());
            } else {
                println!("{}{}", indent, s.yellow());
            }
        }
        serde_yaml::Value::Sequence(seq) => {
            for item in seq {
                println!("{}- ", indent);
                print_yaml_value(item, indent_level + 1);
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (key, val) in map {
                if let serde_yaml::Value::String(key_str) = key {
                    print!("{}{}: ", indent, key_str.cyan());

                    // Print simple values on the same line
                    match val {
                        serde_yaml::Value::Null
                        | serde_yaml::Value::Bool(_)
                        | serde_yaml::Value::Number(_)
                        | serde_yaml::Value::String(_) => {
                            print_yaml_value(val, 0);
                        }
                        _ => {
                            println!();
                            print_yaml_value(val, indent_level + 1);
                        }
                    }
                } else {
                    println!("{}{:?}:", indent, key);
                    print_yaml_value(val, indent_level + 1);
                }
            }
        }
        serde_yaml::Value::Tagged(tagged) => {
            println!("{}!{} ", indent, tagged.tag);
            print_yaml_value(&tagged.value, indent_level + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> serde_yaml::Value {
        serde_yaml::from_str(
            r#"
            environment: production
            server:
                host: "0.0.0.0"
                port: 8080
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_navigate_config_path() {
        let root = sample();

        let result = navigate_config_path(&root, &["server", "port"]).unwrap();
        assert_eq!(result, serde_yaml::Value::Number(8080.into()));

        let result = navigate_config_path(&root, &["environment"]).unwrap();
        assert_eq!(result, serde_yaml::Value::String("production".to_string()));
    }

    #[test]
    fn test_navigate_config_path_errors() {
        let root = sample();

        let err = navigate_config_path(&root, &["server", "tls"]).unwrap_err();
        assert!(err.to_string().contains("server.tls"));

        let err = navigate_config_path(&root, &["environment", "name"]).unwrap_err();
        assert!(err.to_string().contains("not a mapping"));

        assert!(navigate_config_path(&root, &[]).is_err());
    }
}
