use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Error code Daraja returns when the shortcode already has URLs on file
pub const ALREADY_REGISTERED_CODE: &str = "500.003.1001";
pub const ALREADY_REGISTERED_MESSAGE: &str = "URLs are already registered";

/// C2B payment confirmation as posted by M-Pesa to the confirmation URL.
///
/// The transaction fields are required and fail extraction when absent.
/// Payer fields default so that blank and missing values both reach
/// `payer()`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    #[serde(rename = "TransactionType", default)]
    pub transaction_type: Option<String>,
    #[serde(rename = "TransID")]
    pub trans_id: String,
    #[serde(rename = "TransTime")]
    pub trans_time: String,
    #[serde(rename = "TransAmount")]
    pub trans_amount: String,
    #[serde(rename = "BusinessShortCode")]
    pub business_short_code: String,
    #[serde(rename = "BillRefNumber")]
    pub bill_ref_number: String,
    #[serde(rename = "InvoiceNumber", default)]
    pub invoice_number: Option<String>,
    #[serde(rename = "OrgAccountBalance", default)]
    pub org_account_balance: Option<String>,
    #[serde(rename = "ThirdPartyTransID", default)]
    pub third_party_trans_id: Option<String>,
    #[serde(rename = "MSISDN", default)]
    pub msisdn: Option<String>,
    #[serde(rename = "FirstName", default)]
    pub first_name: Option<String>,
    #[serde(rename = "MiddleName", default)]
    pub middle_name: Option<String>,
    #[serde(rename = "LastName", default)]
    pub last_name: Option<String>,
}

/// Who paid, as extracted from a confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayerDetails {
    pub transaction_id: String,
    pub first_name: String,
    pub second_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Which required payer field a confirmation lacked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingPayerField {
    FirstName,
    Msisdn,
}

impl MissingPayerField {
    pub fn field_name(&self) -> &'static str {
        match self {
            MissingPayerField::FirstName => "FirstName",
            MissingPayerField::Msisdn => "MSISDN",
        }
    }
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl PaymentConfirmation {
    /// Extract the payer. Blank first name or phone counts as missing;
    /// middle and last names default to empty.
    pub fn payer(&self) -> Result<PayerDetails, MissingPayerField> {
        let first_name = present(&self.first_name).ok_or(MissingPayerField::FirstName)?;
        let phone = present(&self.msisdn).ok_or(MissingPayerField::Msisdn)?;

        Ok(PayerDetails {
            transaction_id: self.trans_id.clone(),
            first_name,
            second_name: present(&self.middle_name).unwrap_or_default(),
            last_name: present(&self.last_name).unwrap_or_default(),
            phone,
        })
    }
}

/// Short-lived bearer credential. Never cached across calls.
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    pub expires_in: Option<u64>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_in: Option<u64>) -> Self {
        Self {
            token: token.into(),
            expires_in,
        }
    }

    pub fn secret(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// OAuth response body. Daraja sends `expires_in` as a string.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<JsonValue>,
}

impl TokenResponse {
    pub fn expires_in_secs(&self) -> Option<u64> {
        match self.expires_in.as_ref()? {
            JsonValue::Number(n) => n.as_u64(),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RegisterUrlRequest {
    #[serde(rename = "ShortCode")]
    pub short_code: String,
    #[serde(rename = "ResponseType")]
    pub response_type: String,
    #[serde(rename = "ConfirmationURL")]
    pub confirmation_url: String,
    #[serde(rename = "ValidationURL")]
    pub validation_url: String,
}

/// Daraja error body: `{requestId, errorCode, errorMessage}`
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderErrorEnvelope {
    #[serde(rename = "requestId", default)]
    pub request_id: Option<String>,
    #[serde(rename = "errorCode", default)]
    pub error_code: Option<String>,
    #[serde(rename = "errorMessage", default)]
    pub error_message: Option<String>,
}

impl ProviderErrorEnvelope {
    pub fn is_already_registered(&self) -> bool {
        self.error_code.as_deref() == Some(ALREADY_REGISTERED_CODE)
            && self
                .error_message
                .as_deref()
                .is_some_and(|m| m.contains(ALREADY_REGISTERED_MESSAGE))
    }
}

/// Parse `body` and return it when it is the "already registered" envelope
pub fn already_registered_body(body: &str) -> Option<JsonValue> {
    let value: JsonValue = serde_json::from_str(body).ok()?;
    let envelope: ProviderErrorEnvelope = serde_json::from_value(value.clone()).ok()?;
    envelope.is_already_registered().then_some(value)
}

/// Successful end state of URL registration
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    /// The provider accepted the URLs; carries its JSON response
    Registered(JsonValue),
    /// The provider already had URLs on file for the shortcode
    AlreadyRegistered { response_data: JsonValue },
}

impl RegistrationOutcome {
    pub fn is_already_registered(&self) -> bool {
        matches!(self, RegistrationOutcome::AlreadyRegistered { .. })
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            RegistrationOutcome::Registered(body) => body.clone(),
            RegistrationOutcome::AlreadyRegistered { response_data } => serde_json::json!({
                "status": "success",
                "message": ALREADY_REGISTERED_MESSAGE,
                "responseData": response_data,
            }),
        }
    }
}
