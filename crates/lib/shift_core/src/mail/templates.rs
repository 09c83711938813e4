//! HTML templates for account emails.

use url::Url;

use super::OutboundEmail;

/// The account emails Shift sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailKind {
    /// Confirm ownership of the address after registration.
    VerifyAccount { token: String },
    /// Password reset link.
    ChangePassword { token: String },
    /// Suspended account reactivation link.
    ReactivateAccount { token: String },
    /// Admin-initiated deletion notice.
    AccountDeletion { reason: String },
}

impl EmailKind {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::VerifyAccount { .. } => "Verify your account",
            Self::ChangePassword { .. } => "Reset your password",
            Self::ReactivateAccount { .. } => "Reactivate your account",
            Self::AccountDeletion { .. } => "Account deletion notice",
        }
    }

    fn body(&self, app_url: &Url) -> String {
        match self {
            Self::VerifyAccount { token } => format!(
                r#"<p>Just one more step! To protect your account, please click the button below and verify your email.</p>
<a href="{link}" class="button">Verify my account</a>
<p>If you did not sign up for a Shift account, you can safely ignore this message.
This link will expire in 15 minutes for security purposes.</p>"#,
                link = action_link(app_url, "verify-account", token),
            ),
            Self::ChangePassword { token } => format!(
                r#"<p>We received a request to reset the password for your account. To complete this process, please click the link below:</p>
<a href="{link}" class="button">Reset your password</a>
<p>This link will expire in 15 minutes. If you did not request a password reset, you can safely ignore this message.</p>
<p>Your account will remain secure.</p>"#,
                link = action_link(app_url, "change-password", token),
            ),
            Self::ReactivateAccount { token } => format!(
                r#"<p>Your Shift account is currently deactivated. To regain access, please click the button below to reactivate it.</p>
<a href="{link}" class="button">Reactivate my account</a>
<p>This link will expire in 15 minutes. If you did not request this action, you can safely ignore this message.</p>"#,
                link = action_link(app_url, "activate-account", token),
            ),
            Self::AccountDeletion { reason } => format!(
                r#"<p>This is to inform you that your account is subject to deletion, due to <strong>{reason}</strong>. You have been given 15 days to respond, after which your account will be permanently deleted.</p>"#,
                reason = escape_html(reason),
            ),
        }
    }

    /// Render the full message addressed to `to`.
    pub fn render(&self, to: &str, app_url: &Url) -> OutboundEmail {
        let name = to.split('@').next().unwrap_or(to);
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <style>
        a {{ text-decoration: none; color: black; }}
        .container {{ font-family: Tahoma, Verdana; background-color: #f4f4f4; padding: 20px; border-radius: 20px; border: 1px solid grey; }}
        .button {{ display: inline-block; text-align: center; padding: 8px; border-radius: 5px; border: 1px solid transparent; background-color: white; }}
        .button:hover {{ border: 1px solid black; }}
    </style>
</head>
<body>
    <div class="container">
        <p>Hello {name},</p>
        {body}
        <p>Best regards,</p>
        <p><strong>Shift Support</strong></p>
    </div>
</body>
</html>"#,
            name = escape_html(name),
            body = self.body(app_url),
        );

        OutboundEmail {
            to: to.to_string(),
            subject: self.subject().to_string(),
            html,
        }
    }
}

fn action_link(app_url: &Url, action: &str, token: &str) -> String {
    let mut url = app_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push("shift").push(action).push("");
    }
    url.query_pairs_mut().clear().append_pair("token", token);
    url.to_string()
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_url() -> Url {
        Url::parse("http://localhost:3000").unwrap()
    }

    #[test]
    fn verify_link_carries_token() {
        let email = EmailKind::VerifyAccount {
            token: "abc123".into(),
        }
        .render("jo@example.com", &app_url());
        assert_eq!(email.to, "jo@example.com");
        assert_eq!(email.subject, "Verify your account");
        assert!(email.html.contains("http://localhost:3000/shift/verify-account/?token=abc123"));
        assert!(email.html.contains("Hello jo,"));
    }

    #[test]
    fn reset_link_respects_base_path() {
        let base = Url::parse("https://app.example.com/journal/").unwrap();
        let email = EmailKind::ChangePassword { token: "t".into() }.render("a@b.c", &base);
        assert!(email.html.contains("https://app.example.com/journal/shift/change-password/?token=t"));
    }

    #[test]
    fn deletion_reason_is_escaped() {
        let email = EmailKind::AccountDeletion {
            reason: "<script>".into(),
        }
        .render("a@b.c", &app_url());
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
        assert_eq!(email.subject, "Account deletion notice");
    }
}
