//! HTML email templates.
//!
//! Plain string assembly, intentionally free of any templating engine: the
//! bodies are short, the variables few, and the output is the same
//! single-column transactional layout for every message.

use crate::{EmailAttachment, EmailMessage};

/// Inputs shared by the signature-request and reminder templates.
#[derive(Clone, Debug)]
pub struct SignatureRequestParams {
    pub recipient_name: String,
    pub recipient_email: String,
    pub document_title: String,
    pub sender_name: String,
    pub signing_url: String,
    /// Shown in the footer ("This link will expire in N days.").
    pub expiry_days: u32,
}

/// Inputs for the post-completion email.
#[derive(Clone, Debug)]
pub struct CompletionParams {
    pub recipient_name: String,
    pub recipient_email: String,
    pub document_title: String,
    pub download_url: String,
    /// Attached only when the signed PDF fits under the attachment cap.
    pub attachment: Option<EmailAttachment>,
}

pub fn signature_request_email(params: SignatureRequestParams) -> EmailMessage {
    let SignatureRequestParams {
        recipient_name,
        recipient_email,
        document_title,
        sender_name,
        signing_url,
        expiry_days,
    } = params;

    EmailMessage {
        to: recipient_email,
        subject: format!("{sender_name} has requested your signature on \"{document_title}\""),
        html: layout(&format!(
            "<h2>Hello {recipient_name},</h2>\
             <p><strong>{sender_name}</strong> has requested your signature on the document:</p>\
             {}\
             {}\
             <p class=\"fine\">This link will expire in {expiry_days} days. If you have any \
             questions, please contact the sender directly.</p>",
            title_card(&document_title),
            button(&signing_url, "Review &amp; Sign Document"),
        )),
        attachments: vec![],
    }
}

pub fn reminder_email(params: SignatureRequestParams) -> EmailMessage {
    let SignatureRequestParams {
        recipient_name,
        recipient_email,
        document_title,
        sender_name,
        signing_url,
        ..
    } = params;

    EmailMessage {
        to: recipient_email,
        subject: format!("Reminder: \"{document_title}\" is waiting for your signature"),
        html: layout(&format!(
            "<h2>Hello {recipient_name},</h2>\
             <p>This is a friendly reminder that <strong>{sender_name}</strong> is still \
             waiting for your signature on:</p>\
             {}\
             {}",
            title_card(&document_title),
            button(&signing_url, "Review &amp; Sign Document"),
        )),
        attachments: vec![],
    }
}

pub fn completion_email(params: CompletionParams) -> EmailMessage {
    let CompletionParams {
        recipient_name,
        recipient_email,
        document_title,
        download_url,
        attachment,
    } = params;

    let attachment_note = if attachment.is_some() {
        "A copy of the signed document is attached to this email."
    } else {
        "Use the button below to download your copy of the signed document."
    };

    EmailMessage {
        to: recipient_email,
        subject: format!("Completed: \"{document_title}\" has been signed by all parties"),
        html: layout(&format!(
            "<h2>Hello {recipient_name},</h2>\
             <p>All parties have signed the document:</p>\
             {}\
             <p>{attachment_note}</p>\
             {}\
             <p class=\"fine\">This download link is valid for 90 days.</p>",
            title_card(&document_title),
            button(&download_url, "Download Signed Document"),
        )),
        attachments: attachment.into_iter().collect(),
    }
}

pub fn void_notice_email(
    recipient_name: &str,
    recipient_email: &str,
    document_title: &str,
    reason: Option<&str>,
) -> EmailMessage {
    let reason_line = reason
        .map(|r| format!("<p>Reason given: {r}</p>"))
        .unwrap_or_default();

    EmailMessage {
        to: recipient_email.to_string(),
        subject: format!("\"{document_title}\" has been voided"),
        html: layout(&format!(
            "<h2>Hello {recipient_name},</h2>\
             <p>The document below has been voided by the sender and is no longer \
             available for signing:</p>\
             {}\
             {reason_line}",
            title_card(document_title),
        )),
        attachments: vec![],
    }
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"></head>\
         <body style=\"font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; \
         background-color: #f4f4f5; margin: 0; padding: 40px 20px;\">\
         <div style=\"max-width: 600px; margin: 0 auto; background: white; \
         border-radius: 12px; padding: 40px;\">\
         <h1 style=\"text-align: center; font-size: 24px;\">SignFlow</h1>\
         {body}\
         </div>\
         <p style=\"color: #a1a1aa; font-size: 12px; text-align: center; \
         margin-top: 24px;\">Powered by SignFlow</p>\
         </body></html>"
    )
}

fn title_card(title: &str) -> String {
    format!(
        "<div style=\"background-color: #f4f4f5; border-radius: 8px; padding: 16px; \
         margin: 16px 0;\"><strong>{title}</strong></div>"
    )
}

fn button(url: &str, label: &str) -> String {
    format!(
        "<div style=\"text-align: center; margin: 24px 0;\">\
         <a href=\"{url}\" style=\"display: inline-block; background-color: #18181b; \
         color: white; text-decoration: none; padding: 14px 32px; \
         border-radius: 8px; font-weight: 600;\">{label}</a></div>"
    )
}
