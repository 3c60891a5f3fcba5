// SAML assertion helpers
use crate::error::{BmxError, Result};
use crate::models::Role;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use scraper::{Html, Selector};

const AWS_ROLE_ATTRIBUTE: &str = "https://aws.amazon.com/SAML/Attributes/Role";

/// Pull the base64 `SAMLResponse` form value out of an IdP HTML page
pub fn saml_response_from_html(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"input[name="SAMLResponse"]"#)
        .map_err(|e| BmxError::Saml(format!("Invalid selector: {}", e)))?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("value"))
        .map(|value| value.to_string())
        .ok_or_else(|| BmxError::Saml("No SAMLResponse found in response".to_string()))
}

/// Decode a base64 SAML response into its XML text
pub fn decode(encoded: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| BmxError::Saml(format!("Invalid base64 assertion: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| BmxError::Saml(format!("Assertion is not UTF-8: {}", e)))
}

/// List the AWS roles granted by a base64 SAML response
pub fn roles(encoded: &str) -> Result<Vec<Role>> {
    let xml = decode(encoded)?;
    let doc = roxmltree::Document::parse(&xml)
        .map_err(|e| BmxError::Saml(format!("Invalid assertion XML: {}", e)))?;

    doc.descendants()
        .filter(|n| n.has_tag_name("Attribute") && n.attribute("Name") == Some(AWS_ROLE_ATTRIBUTE))
        .flat_map(|attribute| {
            attribute
                .children()
                .filter(|n| n.has_tag_name("AttributeValue"))
        })
        .filter_map(|value| value.text())
        .map(parse_role)
        .collect()
}

/// Parse a `principal,role` attribute value.
///
/// Some IdPs emit the pair the other way round, so the half naming a
/// `:role/` resource is taken as the role ARN.
pub fn parse_role(value: &str) -> Result<Role> {
    let mut parts = value.trim().split(',').map(str::trim);
    let (first, second) = match (parts.next(), parts.next()) {
        (Some(first), Some(second)) if !first.is_empty() && !second.is_empty() => (first, second),
        _ => return Err(BmxError::Saml(format!("Malformed role value '{}'", value))),
    };

    let (principal_arn, arn) = if first.contains(":role/") {
        (second, first)
    } else {
        (first, second)
    };

    let name = arn
        .split_once("role/")
        .map(|(_, name)| name)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| BmxError::Saml(format!("Role ARN '{}' has no role name", arn)))?;

    Ok(Role {
        name: name.to_string(),
        arn: arn.to_string(),
        principal_arn: principal_arn.to_string(),
    })
}
