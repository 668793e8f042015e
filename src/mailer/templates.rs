//! HTML bodies of every transactional email.

pub const VERIFICATION_CODE_PLACEHOLDER: &str = "{verificationCode}";
pub const EXPIRY_NOTICE_PLACEHOLDER: &str = "{expiryNotice}";
pub const FOLLOWER_NAME_PLACEHOLDER: &str = "{followerName}";

pub const VERIFICATION_EMAIL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Verify your email</title>
</head>
<body style="font-family: Arial, sans-serif; background-color: #f4f4f4; margin: 0; padding: 0;">
  <div style="max-width: 600px; margin: 30px auto; background: #ffffff; border-radius: 8px; overflow: hidden;">
    <div style="background-color: #4caf50; color: #ffffff; padding: 20px; text-align: center; font-size: 24px; font-weight: bold;">
      Verify your email
    </div>
    <div style="padding: 25px; color: #333333; line-height: 1.8;">
      <p>Hello,</p>
      <p>Thank you for signing up for ShabdSetu! Please confirm your email address by entering the code below:</p>
      <p style="display: block; margin: 20px 0; font-size: 22px; color: #4caf50; background: #e8f5e9; border: 1px dashed #4caf50; padding: 10px; text-align: center; border-radius: 5px; font-weight: bold; letter-spacing: 2px;">{verificationCode}</p>
      <p>{expiryNotice}</p>
      <p>If you did not create an account, no further action is required.</p>
    </div>
    <div style="background-color: #f4f4f4; padding: 15px; text-align: center; color: #777777; font-size: 12px;">
      &copy; ShabdSetu. All rights reserved.
    </div>
  </div>
</body>
</html>
"#;

pub const PASSWORD_RESET_EMAIL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Reset your password</title>
</head>
<body style="font-family: Arial, sans-serif; background-color: #f4f4f4; margin: 0; padding: 0;">
  <div style="max-width: 600px; margin: 30px auto; background: #ffffff; border-radius: 8px; overflow: hidden;">
    <div style="background-color: #ff7043; color: #ffffff; padding: 20px; text-align: center; font-size: 24px; font-weight: bold;">
      Password reset
    </div>
    <div style="padding: 25px; color: #333333; line-height: 1.8;">
      <p>Hello,</p>
      <p>We received a request to reset the password of your ShabdSetu account. Use the code below to continue:</p>
      <p style="display: block; margin: 20px 0; font-size: 22px; color: #ff7043; background: #fbe9e7; border: 1px dashed #ff7043; padding: 10px; text-align: center; border-radius: 5px; font-weight: bold; letter-spacing: 2px;">{verificationCode}</p>
      <p>If you did not request a password reset, you can safely ignore this email.</p>
    </div>
    <div style="background-color: #f4f4f4; padding: 15px; text-align: center; color: #777777; font-size: 12px;">
      &copy; ShabdSetu. All rights reserved.
    </div>
  </div>
</body>
</html>
"#;

pub const FOLLOW_NOTIFICATION_EMAIL: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>You have a new follower</title>
</head>
<body style="font-family: Arial, sans-serif; background-color: #f4f4f4; margin: 0; padding: 0;">
  <div style="max-width: 600px; margin: 30px auto; background: #ffffff; border-radius: 8px; overflow: hidden;">
    <div style="background-color: #3f51b5; color: #ffffff; padding: 20px; text-align: center; font-size: 24px; font-weight: bold;">
      New follower
    </div>
    <div style="padding: 25px; color: #333333; line-height: 1.8;">
      <p>Hello,</p>
      <p><strong>{followerName}</strong> started following you on ShabdSetu.</p>
      <p>Keep writing, your readers are growing!</p>
    </div>
    <div style="background-color: #f4f4f4; padding: 15px; text-align: center; color: #777777; font-size: 12px;">
      &copy; ShabdSetu. All rights reserved.
    </div>
  </div>
</body>
</html>
"#;

/// Escapes text before it lands inside an HTML template.
#[must_use]
pub fn escape_html(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            other => output.push(other),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_have_placeholders() {
        assert!(VERIFICATION_EMAIL.contains(VERIFICATION_CODE_PLACEHOLDER));
        assert!(VERIFICATION_EMAIL.contains(EXPIRY_NOTICE_PLACEHOLDER));
        assert!(PASSWORD_RESET_EMAIL.contains(VERIFICATION_CODE_PLACEHOLDER));
        assert!(FOLLOW_NOTIFICATION_EMAIL.contains(FOLLOWER_NAME_PLACEHOLDER));
    }

    #[test]
    fn should_escape_markup() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }
}
