//! Confirmation email bodies, rendered from embedded Tera templates.

use tera::{Context, Tera};

use medbook_core::config::ClinicConfig;
use medbook_core::notify::BookingConfirmation;

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body style="font-family: sans-serif; background-color: #f5f5f5; margin: 0; padding: 20px;">
  <div style="max-width: 600px; margin: 0 auto; background: white; border-radius: 10px;">
    <div style="background: #667eea; padding: 30px; text-align: center;">
      <h1 style="color: white; margin: 0; font-size: 24px;">{{ clinic_name }}</h1>
      <p style="color: rgba(255,255,255,0.9); margin: 10px 0 0 0;">Appointment Confirmation</p>
    </div>
    <div style="padding: 30px;">
      <p style="font-size: 18px; color: #333;">Dear <strong>{{ customer_name }}</strong>,</p>
      <p style="color: #666;">Your appointment has been confirmed. Here are your booking details:</p>
      <table style="width: 100%; border-collapse: collapse;">
        <tr><td style="padding: 10px;"><strong>Booking ID:</strong></td><td style="padding: 10px;">#{{ booking_id }}</td></tr>
        <tr><td style="padding: 10px;"><strong>Appointment Type:</strong></td><td style="padding: 10px;">{{ booking_type }}</td></tr>
        <tr><td style="padding: 10px;"><strong>Date:</strong></td><td style="padding: 10px;">{{ date }}</td></tr>
        <tr><td style="padding: 10px;"><strong>Time:</strong></td><td style="padding: 10px;">{{ time }}</td></tr>
        {% if notes %}<tr><td style="padding: 10px;"><strong>Notes:</strong></td><td style="padding: 10px;">{{ notes }}</td></tr>{% endif %}
      </table>
      <p style="color: #856404; background: #fff3cd; padding: 15px;">
        Please arrive 10-15 minutes before your scheduled appointment time and bring a valid ID.
      </p>
      <p style="color: #666;">If you need to reschedule or cancel, please contact us at least 24 hours in advance.</p>
      <p style="margin: 5px 0; color: #666;">{{ clinic_address }}</p>
      <p style="margin: 5px 0; color: #666;">{{ clinic_phone }}</p>
    </div>
    <div style="background: #f8f9fa; padding: 20px; text-align: center;">
      <p style="margin: 0; color: #999; font-size: 12px;">This is an automated confirmation email. Please do not reply.</p>
    </div>
  </div>
</body>
</html>
"#;

const PLAIN_TEMPLATE: &str = r#"Appointment Confirmed - {{ clinic_name }}

Dear {{ customer_name }},

Your appointment has been confirmed.

Booking ID: #{{ booking_id }}
Appointment Type: {{ booking_type }}
Date: {{ date }}
Time: {{ time }}
{% if notes %}Notes: {{ notes }}
{% endif %}
Please arrive 10-15 minutes before your scheduled time.

Location: {{ clinic_address }}
Phone: {{ clinic_phone }}

Thank you for choosing {{ clinic_name }}!
"#;

pub fn confirmation_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template("confirmation.html", HTML_TEMPLATE)?;
    tera.add_raw_template("confirmation.txt", PLAIN_TEMPLATE)?;
    Ok(tera)
}

pub fn subject(clinic: &ClinicConfig, confirmation: &BookingConfirmation) -> String {
    format!(
        "Appointment Confirmed - {} (Booking #{})",
        clinic.name, confirmation.booking_id.0
    )
}

/// Render `(plain_text, html)` bodies for a confirmation.
pub fn render_bodies(
    tera: &Tera,
    clinic: &ClinicConfig,
    confirmation: &BookingConfirmation,
) -> Result<(String, String), tera::Error> {
    let mut context = Context::new();
    context.insert("clinic_name", &clinic.name);
    context.insert("clinic_phone", &clinic.phone);
    context.insert("clinic_address", &clinic.address);
    context.insert("customer_name", &confirmation.customer_name);
    context.insert("booking_id", &confirmation.booking_id.0);
    context.insert("booking_type", &confirmation.booking_type);
    context.insert("date", &confirmation.date);
    context.insert("time", &confirmation.time);
    context.insert("notes", &confirmation.notes);

    let plain = tera.render("confirmation.txt", &context)?;
    let html = tera.render("confirmation.html", &context)?;
    Ok((plain, html))
}
