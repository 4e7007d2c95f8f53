use which::which;

use crate::config::types::ToolsConfig;
use crate::core::jobs::Tool;

/// Programs named by the configured templates (plus `tar`) that are not on PATH.
/// Each `;`/`&&`-separated command in a template counts.
pub fn missing_tools(tools: &ToolsConfig) -> Vec<String> {
    let mut programs: Vec<String> = Tool::ALL
        .iter()
        .flat_map(|tool| programs_in(tools.template(*tool)))
        .collect();
    programs.extend(programs_in(&tools.tar));
    programs.sort();
    programs.dedup();

    programs
        .into_iter()
        .filter(|program| match which(program) {
            Ok(path) => {
                tracing::debug!("Found {}: {:?}", program, path);
                false
            }
            Err(_) => true,
        })
        .collect()
}

fn programs_in(template: &str) -> Vec<String> {
    template
        .split([';', '|', '&'])
        .filter_map(|segment| segment.split_whitespace().next())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_programs_in_compound_template() {
        let programs = programs_in("curl -s {url}/robots.txt; curl -s {url}/sitemap.xml && dig {target}");
        assert_eq!(programs, vec!["curl", "curl", "dig"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_reports_missing_programs() {
        let tools = ToolsConfig {
            nmap: "definitely-missing-scanner {target}".to_string(),
            tar: "sh".to_string(),
            ..ToolsConfig::default()
        };
        let missing = missing_tools(&tools);
        assert!(missing.contains(&"definitely-missing-scanner".to_string()));
        assert!(!missing.contains(&"sh".to_string()));
    }
}
