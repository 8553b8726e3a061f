use anyhow::Result;
use lettre::{
    message::{header::ContentType, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::settings::SmtpSettings;

/// Templated transactional sends, keyed by template identifier with a
/// substitution-variable map. Every failure here is non-fatal to the
/// calling flow; callers log and move on.
#[derive(Clone, Copy, Debug)]
pub enum TemplateId {
    Welcome,
    LeadMagnet,
    ContactConfirmation,
}

impl TemplateId {
    fn file(&self) -> &'static str {
        match self {
            TemplateId::Welcome => "welcome.html",
            TemplateId::LeadMagnet => "lead_magnet.html",
            TemplateId::ContactConfirmation => "contact_confirmation.html",
        }
    }

    fn subject(&self) -> &'static str {
        match self {
            TemplateId::Welcome => "Welcome to the show",
            TemplateId::LeadMagnet => "Your leadership toolkit is ready",
            TemplateId::ContactConfirmation => "We got your message",
        }
    }

    fn plain_fallback(&self) -> &'static str {
        match self {
            TemplateId::Welcome => {
                "Welcome aboard! You're on the list — new episodes and posts land in your inbox."
            }
            TemplateId::LeadMagnet => {
                "Your download is ready. Use the link from this email to grab the toolkit."
            }
            TemplateId::ContactConfirmation => {
                "Thanks for reaching out. We'll get back to you within 24 hours."
            }
        }
    }
}

#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_email: String,
    from_name: String,
    templates_dir: String,
}

impl EmailService {
    pub fn new(smtp: &SmtpSettings) -> Result<Self> {
        let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());

        // Port 465 is implicit TLS; everything else starts plain and
        // upgrades via STARTTLS.
        let mailer: AsyncSmtpTransport<Tokio1Executor> = if smtp.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?
                .port(smtp.port)
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
                .port(smtp.port)
                .credentials(creds)
                .build()
        };

        Ok(Self {
            mailer,
            from_email: smtp.from_email.clone(),
            from_name: smtp.from_name.clone(),
            templates_dir: "templates/emails".to_string(),
        })
    }

    fn load_template(
        &self,
        template: TemplateId,
        variables: &HashMap<&str, String>,
    ) -> Result<String> {
        let path = Path::new(&self.templates_dir).join(template.file());
        let mut html = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read template {}: {}", template.file(), e))?;

        for (key, value) in variables {
            html = html.replace(&format!("{{{{{}}}}}", key), value);
        }

        Ok(html)
    }

    pub async fn send(
        &self,
        to_email: &str,
        template: TemplateId,
        variables: &HashMap<&str, String>,
    ) -> Result<()> {
        let html_body = self.load_template(template, variables)?;
        let from = format!("{} <{}>", self.from_name, self.from_email);

        let email = Message::builder()
            .from(from.parse()?)
            .to(to_email.parse()?)
            .subject(template.subject())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(template.plain_fallback().to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        self.mailer.send(email).await?;
        tracing::info!("sent {:?} email to {}", template, to_email);
        Ok(())
    }
}
