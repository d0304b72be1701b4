//! Salesforce authentication module.
//!
//! Handles the SOAP `login` call that exchanges a username, password and
//! security token for a session id usable against the REST API.

use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;
use url::Url;

use super::SalesforceError;
use crate::credentials::SalesforceCredentials;

/// Client name reported in the SOAP `CallOptions` header.
const CLIENT_NAME: &str = "partner-map";

/// Session lifetime assumed when the login response omits it (2 hours, the
/// Salesforce default).
const DEFAULT_SESSION_SECONDS: i64 = 7200;

/// Session obtained from a successful login.
#[derive(Debug, Clone)]
pub struct SalesforceSession {
    /// Session id, sent as a bearer token.
    pub session_id: SecretString,
    /// Scheme and host of the org's instance, e.g. `https://eu12.my.salesforce.com`.
    pub instance_url: Url,
    /// Unix timestamp after which the session is no longer valid.
    pub expires_at: i64,
}

impl SalesforceSession {
    /// Check if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        // Consider expired if less than 60 seconds remaining
        now >= self.expires_at - 60
    }
}

/// Log in via the SOAP partner API.
///
/// # Errors
///
/// Returns `SalesforceError::AuthenticationFailed` with the SOAP fault string
/// if the credentials are rejected, `SalesforceError::MalformedLogin` if the
/// response cannot be interpreted, and `SalesforceError::Http` on transport
/// failures.
#[instrument(skip(client, credentials), fields(username = %credentials.username))]
pub async fn login(
    client: &reqwest::Client,
    login_url: &str,
    api_version: &str,
    credentials: &SalesforceCredentials,
) -> Result<SalesforceSession, SalesforceError> {
    let now = chrono::Utc::now().timestamp();
    let endpoint = format!("{login_url}/services/Soap/u/{api_version}");

    let body = login_envelope(
        &credentials.username,
        &credentials.password_with_token(),
    );

    let response = client
        .post(&endpoint)
        .header("Content-Type", "text/xml; charset=UTF-8")
        .header("SOAPAction", "login")
        .body(body)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let reason = element_text(&text, "faultstring")
            .map_or_else(|| format!("HTTP {status}"), unescape_xml);
        return Err(SalesforceError::AuthenticationFailed(reason));
    }

    parse_login_response(&text, now)
}

/// Build the SOAP login envelope.
fn login_envelope(username: &str, password: &SecretString) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8" ?>"#,
            r#"<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
            r#"xmlns:env="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"xmlns:urn="urn:partner.soap.sforce.com">"#,
            r"<env:Header><urn:CallOptions><urn:client>{client}</urn:client></urn:CallOptions></env:Header>",
            r#"<env:Body><n1:login xmlns:n1="urn:partner.soap.sforce.com">"#,
            r"<n1:username>{username}</n1:username>",
            r"<n1:password>{password}</n1:password>",
            r"</n1:login></env:Body></env:Envelope>"
        ),
        client = CLIENT_NAME,
        username = escape_xml(username),
        password = escape_xml(password.expose_secret()),
    )
}

/// Extract the session from a successful login response.
fn parse_login_response(xml: &str, now: i64) -> Result<SalesforceSession, SalesforceError> {
    let session_id = element_text(xml, "sessionId")
        .ok_or_else(|| SalesforceError::MalformedLogin("missing sessionId".to_string()))?;
    let server_url = element_text(xml, "serverUrl")
        .ok_or_else(|| SalesforceError::MalformedLogin("missing serverUrl".to_string()))?;
    let seconds_valid = element_text(xml, "sessionSecondsValid")
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_SESSION_SECONDS);

    Ok(SalesforceSession {
        session_id: SecretString::from(unescape_xml(session_id)),
        instance_url: instance_url(&unescape_xml(server_url))?,
        expires_at: now + seconds_valid,
    })
}

/// Reduce a SOAP server URL to the instance origin.
///
/// `https://eu12.my.salesforce.com/services/Soap/u/59.0/00D0900000ABC` becomes
/// `https://eu12.my.salesforce.com/`.
fn instance_url(server_url: &str) -> Result<Url, SalesforceError> {
    let parsed = Url::parse(server_url)
        .map_err(|e| SalesforceError::MalformedLogin(format!("invalid serverUrl: {e}")))?;
    if parsed.host_str().is_none() {
        return Err(SalesforceError::MalformedLogin(
            "serverUrl has no host".to_string(),
        ));
    }
    parsed
        .join("/")
        .map_err(|e| SalesforceError::MalformedLogin(format!("invalid serverUrl: {e}")))
}

/// Text content of the first `<tag>` element, ignoring namespace prefixes.
///
/// Login responses are flat and small; this avoids pulling in a full XML
/// parser for three fields.
fn element_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let mut search_from = 0;
    while let Some(rel) = xml.get(search_from..)?.find('<') {
        let open_start = search_from + rel;
        let open_end = open_start + xml.get(open_start..)?.find('>')?;
        let name = xml.get(open_start + 1..open_end)?;
        let local = name.split_whitespace().next()?;
        let local = local.rsplit(':').next()?;

        if local == tag && !name.starts_with('/') && !name.ends_with('/') {
            let content_start = open_end + 1;
            let close_rel = xml.get(content_start..)?.find("</")?;
            return xml.get(content_start..content_start + close_rel);
        }
        search_from = open_end + 1;
    }
    None
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LOGIN_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="urn:partner.soap.sforce.com">
<soapenv:Body><loginResponse><result>
<metadataServerUrl>https://eu12.my.salesforce.com/services/Soap/m/59.0/00D0900000ABC</metadataServerUrl>
<passwordExpired>false</passwordExpired>
<sandbox>false</sandbox>
<serverUrl>https://eu12.my.salesforce.com/services/Soap/u/59.0/00D0900000ABC</serverUrl>
<sessionId>00D0900000ABC!AQ4AQ&amp;xyz</sessionId>
<userId>0050900000DEF</userId>
<userInfo><sessionSecondsValid>3600</sessionSecondsValid></userInfo>
</result></loginResponse></soapenv:Body></soapenv:Envelope>"#;

    #[test]
    fn test_parse_login_response() {
        let session = parse_login_response(LOGIN_RESPONSE, 1_000).unwrap();
        assert_eq!(session.session_id.expose_secret(), "00D0900000ABC!AQ4AQ&xyz");
        assert_eq!(
            session.instance_url.as_str(),
            "https://eu12.my.salesforce.com/"
        );
        assert_eq!(session.expires_at, 4_600);
    }

    #[test]
    fn test_parse_login_response_missing_session() {
        let err = parse_login_response("<result><serverUrl>https://x</serverUrl></result>", 0)
            .unwrap_err();
        assert!(matches!(err, SalesforceError::MalformedLogin(_)));
    }

    #[test]
    fn test_element_text_skips_prefixed_and_similar_tags() {
        let xml = "<a:metadataServerUrl>m</a:metadataServerUrl><sf:serverUrl>s</sf:serverUrl>";
        assert_eq!(element_text(xml, "serverUrl"), Some("s"));
        assert_eq!(element_text(xml, "metadataServerUrl"), Some("m"));
        assert_eq!(element_text(xml, "sessionId"), None);
    }

    #[test]
    fn test_fault_string_extraction() {
        let fault = r"<soapenv:Fault><faultcode>sf:INVALID_LOGIN</faultcode><faultstring>INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring></soapenv:Fault>";
        assert_eq!(
            element_text(fault, "faultstring"),
            Some("INVALID_LOGIN: Invalid username, password, security token; or user locked out.")
        );
    }

    #[test]
    fn test_login_envelope_escapes_credentials() {
        let body = login_envelope("a&b@example.com", &SecretString::from("p<w>\"tok"));
        assert!(body.contains("<n1:username>a&amp;b@example.com</n1:username>"));
        assert!(body.contains("<n1:password>p&lt;w&gt;&quot;tok</n1:password>"));
    }

    #[test]
    fn test_session_expiry() {
        let now = chrono::Utc::now().timestamp();
        let session = SalesforceSession {
            session_id: SecretString::from("sid"),
            instance_url: Url::parse("https://eu12.my.salesforce.com/").unwrap(),
            expires_at: now + 30,
        };
        assert!(session.is_expired());

        let fresh = SalesforceSession {
            expires_at: now + 3600,
            ..session
        };
        assert!(!fresh.is_expired());
    }
}
