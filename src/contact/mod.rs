use serde::{Deserialize, Serialize};
use validator::Validate;

pub mod handler;

/// What kind of inquiry the contact form is carrying. Each kind renders
/// a different field set, driven entirely by the registry below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryKind {
    Contact,
    Speaking,
    Guest,
    Consultation,
    Collaboration,
    Media,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Phone,
    Textarea,
    Select,
    File,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, kind: FieldKind, required: bool) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required,
    }
}

const NAME: FieldSpec = field("name", FieldKind::Text, true);
const EMAIL: FieldSpec = field("email", FieldKind::Email, true);
const COMPANY: FieldSpec = field("company", FieldKind::Text, false);
const ROLE: FieldSpec = field("role", FieldKind::Text, false);
const PHONE: FieldSpec = field("phone", FieldKind::Phone, false);
const SUBJECT: FieldSpec = field("subject", FieldKind::Text, true);
const MESSAGE: FieldSpec = field("message", FieldKind::Textarea, true);
const PREFERRED_CONTACT: FieldSpec = field("preferred_contact", FieldKind::Select, false);
const BUDGET: FieldSpec = field("budget", FieldKind::Select, false);
const TIMELINE: FieldSpec = field("timeline", FieldKind::Select, false);
const REFERRAL_SOURCE: FieldSpec = field("referral_source", FieldKind::Text, false);
const ATTACHMENT: FieldSpec = field("attachment_url", FieldKind::File, false);

/// Ordered field descriptors per inquiry kind. The front end renders
/// exactly this list; the submit handler validates against it.
pub fn fields_for(kind: InquiryKind) -> &'static [FieldSpec] {
    match kind {
        InquiryKind::Contact => &[NAME, EMAIL, SUBJECT, MESSAGE, PREFERRED_CONTACT],
        InquiryKind::Speaking => &[
            NAME, EMAIL, COMPANY, PHONE, SUBJECT, MESSAGE, BUDGET, TIMELINE, ATTACHMENT,
        ],
        InquiryKind::Guest => &[
            NAME,
            EMAIL,
            COMPANY,
            ROLE,
            SUBJECT,
            MESSAGE,
            REFERRAL_SOURCE,
            ATTACHMENT,
        ],
        InquiryKind::Consultation => &[
            NAME, EMAIL, COMPANY, ROLE, PHONE, SUBJECT, MESSAGE, BUDGET, TIMELINE,
        ],
        InquiryKind::Collaboration => {
            &[NAME, EMAIL, COMPANY, ROLE, SUBJECT, MESSAGE, TIMELINE, ATTACHMENT]
        }
        InquiryKind::Media => &[NAME, EMAIL, COMPANY, PHONE, SUBJECT, MESSAGE, TIMELINE],
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactSubmission {
    pub inquiry_type: InquiryKind,
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub preferred_contact: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub referral_source: Option<String>,
    pub attachment_url: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: String,
}

fn default_priority() -> String {
    "normal".to_string()
}

impl InquiryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryKind::Contact => "contact",
            InquiryKind::Speaking => "speaking",
            InquiryKind::Guest => "guest",
            InquiryKind::Consultation => "consultation",
            InquiryKind::Collaboration => "collaboration",
            InquiryKind::Media => "media",
        }
    }
}

impl ContactSubmission {
    fn value_of(&self, name: &str) -> Option<&str> {
        let v = match name {
            "name" => &self.name,
            "email" => &self.email,
            "company" => &self.company,
            "role" => &self.role,
            "phone" => &self.phone,
            "subject" => &self.subject,
            "message" => &self.message,
            "preferred_contact" => &self.preferred_contact,
            "budget" => &self.budget,
            "timeline" => &self.timeline,
            "referral_source" => &self.referral_source,
            "attachment_url" => &self.attachment_url,
            _ => &None,
        };
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Check the submission against the registry for its inquiry kind.
    /// Returns the names of missing required fields.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        fields_for(self.inquiry_type)
            .iter()
            .filter(|spec| spec.required && self.value_of(spec.name).is_none())
            .map(|spec| spec.name)
            .collect()
    }
}
