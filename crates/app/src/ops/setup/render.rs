use common::prelude::{Connector, SetupStep};
use service::WizardView;

pub fn wizard(view: &WizardView) -> String {
    let mut lines = vec![format!("step: {}", view.step)];

    match &view.step {
        SetupStep::None => {}
        SetupStep::Create => {
            let locked = if view.kind_locked { " (locked)" } else { "" };
            lines.push(format!("cloud: {}{}", view.selected_kind, locked));
        }
        SetupStep::Full(connectors) => {
            lines.extend(connectors.iter().map(connector));
        }
        step => {
            if let Some(c) = step.connector() {
                lines.push(connector(c));
            }
        }
    }

    if let Some(hint) = next_hint(view) {
        lines.push(hint.to_string());
    }
    if let Some(error) = &view.error {
        lines.push(format!("error: {}", error));
    }
    lines.join("\n")
}

fn connector(c: &Connector) -> String {
    format!("  {} {} [{}] {}", c.id, c.name, c.connector_type, c.status)
}

fn next_hint(view: &WizardView) -> Option<&'static str> {
    if view.completed {
        return Some("setup complete");
    }
    let hint = match view.step {
        SetupStep::Create => "next: dspm setup create",
        SetupStep::Deploy(_) => "next: deploy the connector, then dspm setup deploy",
        SetupStep::Configure(_) => "next: dspm setup configure <s3|azure>",
        SetupStep::Sync(_) => "next: dspm setup sync",
        SetupStep::ExistingPrompt(_) => "next: dspm setup expand to add the other cloud",
        SetupStep::None | SetupStep::Error(_) | SetupStep::Full(_) => return None,
    };
    Some(hint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::prelude::{CloudKind, ConnectorStatus, ConnectorType};

    fn s3() -> Connector {
        Connector {
            id: "c1".to_string(),
            connector_type: ConnectorType::S3,
            name: "AWS".to_string(),
            status: ConnectorStatus::Created,
        }
    }

    #[test]
    fn test_create_shows_locked_kind() {
        let view = WizardView {
            step: SetupStep::Create,
            selected_kind: CloudKind::Aws,
            kind_locked: true,
            ..Default::default()
        };
        let out = wizard(&view);
        assert!(out.contains("cloud: AWS (locked)"));
        assert!(out.contains("dspm setup create"));
    }

    #[test]
    fn test_error_is_printed_last() {
        let view = WizardView {
            step: SetupStep::Deploy(s3()),
            error: Some("Failed to create connector".to_string()),
            ..Default::default()
        };
        let out = wizard(&view);
        assert!(out.starts_with("step: deploy"));
        assert!(out.contains("c1 AWS"));
        assert!(out.ends_with("error: Failed to create connector"));
    }
}
