//! Export formatters
//!
//! [`DscFormatter`] writes PowerShell DSC resource blocks, [`TomlFormatter`]
//! writes desired-state document tables that `get`/`test`/`set` read back.

use chrono::{DateTime, Utc};
use declarative::{AuthMethod, ConnectionContext, FieldValue, Formatter};

use crate::resource::ResourceKind;

const BLOCK_INDENT: &str = "        ";
const FIELD_INDENT: &str = "            ";

// ============================================================================
// PowerShell DSC
// ============================================================================

pub struct DscFormatter;

impl Formatter for DscFormatter {
    fn format_block(
        &self,
        resource_type: &str,
        key: &str,
        fields: &[(&'static str, FieldValue)],
        ctx: &ConnectionContext,
    ) -> String {
        let mut lines: Vec<(&str, String)> = fields
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (*name, powershell_value(value)))
            .collect();

        for &name in ctx.auth.connection_parameters() {
            lines.push((name, connection_reference(name).to_string()));
        }
        lines.sort_by(|a, b| a.0.cmp(b.0));

        let width = lines.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

        let mut out = format!(
            "{BLOCK_INDENT}{resource_type} {}\n{BLOCK_INDENT}{{\n",
            powershell_string(&format!("{resource_type}-{key}"))
        );
        for (name, value) in lines {
            out.push_str(&format!("{FIELD_INDENT}{name:<width$} = {value};\n"));
        }
        out.push_str(&format!("{BLOCK_INDENT}}}\n"));
        out
    }
}

/// Expression a block uses for a connection parameter; secrets stay in
/// configuration data
fn connection_reference(name: &str) -> &'static str {
    match name {
        "TenantId" => "$OrganizationName",
        "ApplicationId" => "$ConfigurationData.NonNodeData.ApplicationId",
        "CertificateThumbprint" => "$ConfigurationData.NonNodeData.CertificateThumbprint",
        "ApplicationSecret" => "$ConfigurationData.NonNodeData.ApplicationSecret",
        "ManagedIdentity" => "$ConfigurationData.NonNodeData.ManagedIdentity",
        "AccessTokens" => "$ConfigurationData.NonNodeData.AccessTokens",
        "Credential" => "$Credscredential",
        _ => "$null",
    }
}

/// Double-quoted PowerShell string literal
fn powershell_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '`' | '"' | '$') {
            out.push('`');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn powershell_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => "$null".to_string(),
        FieldValue::Bool(true) => "$True".to_string(),
        FieldValue::Bool(false) => "$False".to_string(),
        FieldValue::Integer(n) => n.to_string(),
        FieldValue::String(s) => powershell_string(s),
        FieldValue::StringList(items) => {
            let items: Vec<String> = items.iter().map(|s| powershell_string(s)).collect();
            format!("@({})", items.join(","))
        }
    }
}

/// Wrap exported blocks in a complete `Configuration` script
pub fn wrap_configuration(
    name: &str,
    ctx: &ConnectionContext,
    blocks: &str,
    generated: DateTime<Utc>,
) -> String {
    let mut out = format!(
        "# Generated by m365dsc {} on {}\n# Tenant: {}\n",
        env!("CARGO_PKG_VERSION"),
        generated.format("%Y-%m-%d %H:%M:%S UTC"),
        ctx.tenant_id
    );
    out.push_str(&format!("Configuration {name}\n{{\n"));

    if matches!(ctx.auth, AuthMethod::Credentials { .. }) {
        out.push_str("    param\n    (\n");
        out.push_str("        [parameter()]\n");
        out.push_str("        [System.Management.Automation.PSCredential]\n");
        out.push_str("        $Credential\n    )\n\n");
        out.push_str("    $Credscredential = $Credential\n");
    }
    out.push_str("    $OrganizationName = $ConfigurationData.NonNodeData.OrganizationName\n\n");
    out.push_str("    Import-DscResource -ModuleName 'Microsoft365DSC'\n\n");
    out.push_str("    Node localhost\n    {\n");
    out.push_str(blocks);
    out.push_str("    }\n}\n\n");
    out.push_str(&format!(
        "{name} -ConfigurationData .\\ConfigurationData.psd1\n"
    ));
    out
}

// ============================================================================
// TOML desired-state document
// ============================================================================

pub struct TomlFormatter;

impl Formatter for TomlFormatter {
    fn format_block(
        &self,
        resource_type: &str,
        _key: &str,
        fields: &[(&'static str, FieldValue)],
        _ctx: &ConnectionContext,
    ) -> String {
        let descriptor = ResourceKind::from_name(resource_type).map(ResourceKind::descriptor);

        let mut out = String::from("[[resource]]\n");
        out.push_str(&format!("type = {}\n", toml::Value::String(resource_type.to_string())));

        let ensure = fields.iter().find(|(name, _)| *name == "Ensure");
        if let Some((_, value)) = ensure {
            push_toml_line(&mut out, "Ensure", value);
        }

        for (name, value) in fields {
            // Read-only fields would be rejected when the document is read back
            if *name == "Ensure" || descriptor.is_some_and(|d| d.is_excluded(name)) {
                continue;
            }
            push_toml_line(&mut out, name, value);
        }
        out.push('\n');
        out
    }
}

fn push_toml_line(out: &mut String, name: &str, value: &FieldValue) {
    if let Some(value) = toml_value(value) {
        out.push_str(&format!("{name} = {value}\n"));
    }
}

fn toml_value(value: &FieldValue) -> Option<toml::Value> {
    match value {
        FieldValue::Null => None,
        FieldValue::Bool(b) => Some(toml::Value::Boolean(*b)),
        FieldValue::Integer(n) => Some(toml::Value::Integer(*n)),
        FieldValue::String(s) => Some(toml::Value::String(s.clone())),
        FieldValue::StringList(items) => Some(toml::Value::Array(
            items.iter().cloned().map(toml::Value::String).collect(),
        )),
    }
}
