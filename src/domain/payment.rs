use crate::error::{PortalError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const COUNTRY_PREFIX: &str = "+254";
const SUBSCRIBER_DIGITS: usize = 9;

/// Returns true only for `+254` followed by exactly nine ASCII digits.
pub fn validate_phone(phone: &str) -> bool {
    phone.strip_prefix(COUNTRY_PREFIX).is_some_and(|rest| {
        rest.len() == SUBSCRIBER_DIGITS && rest.bytes().all(|b| b.is_ascii_digit())
    })
}

/// A Kenyan mobile number in international form, e.g. `+254712345678`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(value: &str) -> Result<Self> {
        if validate_phone(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(PortalError::ValidationError(format!(
                "invalid phone number: {value:?}"
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of the payment creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRequest {
    pub package_id: u64,
    pub phone: PhoneNumber,
}

/// Correlates a pending payment with its status polls.
///
/// The backend hands out M-Pesa checkout request ids as strings, but numeric
/// ids are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(s) => Self(s),
            Repr::Number(n) => Self(n.to_string()),
        })
    }
}

/// Outcome of the payment creation call.
#[derive(Debug, Clone, PartialEq)]
pub enum InitiationResponse {
    /// The server refused the request; the message is shown verbatim.
    Rejected { error: String },
    /// An STK push was sent to the phone.
    Pending { transaction_id: TransactionId },
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawInitiation {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    transaction_id: Option<TransactionId>,
}

impl TryFrom<RawInitiation> for InitiationResponse {
    type Error = PortalError;

    fn try_from(raw: RawInitiation) -> Result<Self> {
        if let Some(error) = raw.error.filter(|e| !e.is_empty()) {
            return Ok(InitiationResponse::Rejected { error });
        }
        match (raw.status.as_deref(), raw.transaction_id) {
            (Some("pending"), Some(transaction_id)) => {
                Ok(InitiationResponse::Pending { transaction_id })
            }
            (Some("pending"), None) => Err(PortalError::UnexpectedResponse(
                "pending payment without transaction_id".to_string(),
            )),
            (status, _) => Err(PortalError::UnexpectedResponse(format!(
                "payment creation returned status {status:?}"
            ))),
        }
    }
}

/// Which credential scheme the operator issues for hotspot logins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum LoginMethod {
    Voucher,
    Transaction,
    Other(String),
}

impl LoginMethod {
    /// Caption shown in front of the username value.
    pub fn label(&self) -> &'static str {
        match self {
            LoginMethod::Voucher => "Voucher Code",
            LoginMethod::Transaction => "Transaction ID",
            LoginMethod::Other(_) => "Username",
        }
    }
}

impl From<String> for LoginMethod {
    fn from(value: String) -> Self {
        match value.as_str() {
            "VOUCHER" => LoginMethod::Voucher,
            "TRANSACTION" => LoginMethod::Transaction,
            _ => LoginMethod::Other(value),
        }
    }
}

/// Hotspot credentials issued after a successful payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub login_method: LoginMethod,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn summary(&self) -> String {
        format!(
            "Payment successful! {}: {}, Password: {}",
            self.login_method.label(),
            self.username,
            self.password
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentStatus {
    Pending,
    Success(Credentials),
    /// The payment went through but the backend sent no usable credentials.
    ConfirmedWithoutCredentials,
    Failed,
    /// Any other status value; polling carries on.
    Unrecognized(String),
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Success(_)
                | PaymentStatus::ConfirmedWithoutCredentials
                | PaymentStatus::Failed
        )
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    login_method: Option<LoginMethod>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

impl TryFrom<RawStatus> for PaymentStatus {
    type Error = PortalError;

    fn try_from(raw: RawStatus) -> Result<Self> {
        match raw.status.as_deref() {
            Some("pending") => Ok(PaymentStatus::Pending),
            Some("failed") => Ok(PaymentStatus::Failed),
            Some("success") => match (raw.username, raw.password) {
                (Some(username), Some(password)) => Ok(PaymentStatus::Success(Credentials {
                    login_method: raw
                        .login_method
                        .unwrap_or_else(|| LoginMethod::Other(String::new())),
                    username,
                    password,
                })),
                _ => Ok(PaymentStatus::ConfirmedWithoutCredentials),
            },
            other => Ok(PaymentStatus::Unrecognized(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+254712345678"));
        assert!(!validate_phone("0712345678"));
        assert!(!validate_phone("+25471234567"));
        assert!(!validate_phone("+2547123456789"));
        assert!(!validate_phone("+254 12345678"));
        assert!(!validate_phone("254712345678"));
        assert!(!validate_phone("+254712345678\n"));
        assert!(!validate_phone(""));
    }

    #[test]
    fn test_phone_number_parse() {
        let phone = PhoneNumber::parse("+254700000001").unwrap();
        assert_eq!(phone.as_str(), "+254700000001");
        assert!(matches!(
            PhoneNumber::parse("0700000001"),
            Err(PortalError::ValidationError(_))
        ));
    }

    #[test]
    fn test_payment_request_serialization() {
        let request = PaymentRequest {
            package_id: 7,
            phone: PhoneNumber::parse("+254712345678").unwrap(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"package_id": 7, "phone": "+254712345678"})
        );
    }

    #[test]
    fn test_initiation_response_variants() {
        let raw: RawInitiation = serde_json::from_str(r#"{"error": "Package not found"}"#).unwrap();
        assert_eq!(
            InitiationResponse::try_from(raw).unwrap(),
            InitiationResponse::Rejected {
                error: "Package not found".to_string()
            }
        );

        let raw: RawInitiation =
            serde_json::from_str(r#"{"status": "pending", "transaction_id": "ws_CO_123"}"#).unwrap();
        assert_eq!(
            InitiationResponse::try_from(raw).unwrap(),
            InitiationResponse::Pending {
                transaction_id: TransactionId::new("ws_CO_123")
            }
        );

        let raw: RawInitiation =
            serde_json::from_str(r#"{"status": "pending", "transaction_id": 42}"#).unwrap();
        assert_eq!(
            InitiationResponse::try_from(raw).unwrap(),
            InitiationResponse::Pending {
                transaction_id: TransactionId::new("42")
            }
        );

        let raw: RawInitiation = serde_json::from_str(r#"{"status": "queued"}"#).unwrap();
        assert!(matches!(
            InitiationResponse::try_from(raw),
            Err(PortalError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_success_status_summary_per_login_method() {
        let raw: RawStatus = serde_json::from_str(
            r#"{"status": "success", "login_method": "VOUCHER", "username": "K7QX2", "password": "hotspot123"}"#,
        )
        .unwrap();
        let PaymentStatus::Success(credentials) = PaymentStatus::try_from(raw).unwrap() else {
            panic!("expected success");
        };
        assert_eq!(
            credentials.summary(),
            "Payment successful! Voucher Code: K7QX2, Password: hotspot123"
        );

        let transaction = Credentials {
            login_method: LoginMethod::Transaction,
            username: "ws_CO_1".to_string(),
            password: "pw".to_string(),
        };
        assert!(transaction.summary().contains("Transaction ID: ws_CO_1"));

        let phone = Credentials {
            login_method: LoginMethod::from("PHONE".to_string()),
            username: "hotspot_+254712345678".to_string(),
            password: "pw".to_string(),
        };
        assert!(phone.summary().contains("Username: hotspot_+254712345678"));
    }

    #[test]
    fn test_status_parsing_edge_cases() {
        let raw: RawStatus = serde_json::from_str(r#"{"status": "failed"}"#).unwrap();
        assert_eq!(PaymentStatus::try_from(raw).unwrap(), PaymentStatus::Failed);

        let raw: RawStatus = serde_json::from_str(r#"{"status": "processing"}"#).unwrap();
        let status = PaymentStatus::try_from(raw).unwrap();
        assert_eq!(status, PaymentStatus::Unrecognized("processing".to_string()));
        assert!(!status.is_terminal());

        let raw: RawStatus = serde_json::from_str(r#"{"status": "success"}"#).unwrap();
        let status = PaymentStatus::try_from(raw).unwrap();
        assert_eq!(status, PaymentStatus::ConfirmedWithoutCredentials);
        assert!(status.is_terminal());

        let raw: RawStatus = serde_json::from_str(
            r#"{"status": "success", "login_method": "VOUCHER", "username": "V1"}"#,
        )
        .unwrap();
        assert_eq!(
            PaymentStatus::try_from(raw).unwrap(),
            PaymentStatus::ConfirmedWithoutCredentials
        );

        let raw: RawStatus =
            serde_json::from_str(r#"{"status": "success", "username": "u", "password": "p"}"#)
                .unwrap();
        let PaymentStatus::Success(credentials) = PaymentStatus::try_from(raw).unwrap() else {
            panic!("expected success");
        };
        assert_eq!(credentials.login_method.label(), "Username");
    }
}
