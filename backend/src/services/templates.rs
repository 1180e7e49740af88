//! HTML email bodies
//!
//! Every interpolated value goes through [`escape_html`].

use shared::{LowStockEvent, Product};

use crate::external::OutgoingMail;

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn low_stock_alert(to: &str, event: &LowStockEvent) -> OutgoingMail {
    let product = escape_html(&event.product_name);
    let responsible = escape_html(&event.responsible_name);

    OutgoingMail {
        to: to.to_string(),
        subject: format!("Stock alert: {} is below its minimum", event.product_name),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; color: #333;">
  <h2 style="color: #c0392b;">Low stock alert</h2>
  <p>The product <strong>{product}</strong> (id {id}) fell below its minimum stock after an outbound movement.</p>
  <ul>
    <li>Current stock: <strong>{stock}</strong></li>
    <li>Minimum stock: {min}</li>
    <li>Movement registered by: {responsible}</li>
  </ul>
  <p>Please plan a replenishment.</p>
</div>"#,
            product = product,
            id = event.product_id,
            stock = event.stock_level,
            min = event.min_stock,
            responsible = responsible,
        ),
    }
}

pub fn low_stock_digest(to: &str, products: &[Product]) -> OutgoingMail {
    let rows: String = products
        .iter()
        .map(|p| {
            format!(
                "    <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&p.name),
                escape_html(&p.code),
                p.min_stock,
                p.current_stock,
                p.deficit()
            )
        })
        .collect();

    OutgoingMail {
        to: to.to_string(),
        subject: format!("Inventory report: {} product(s) below minimum stock", products.len()),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; color: #333;">
  <h2>Products below minimum stock</h2>
  <table border="1" cellpadding="6" cellspacing="0">
    <tr><th>Product</th><th>Code</th><th>Minimum</th><th>Current</th><th>Deficit</th></tr>
{rows}  </table>
</div>"#,
            rows = rows
        ),
    }
}

pub fn verification_code(to: &str, name: &str, code: &str) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Your verification code".to_string(),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; color: #333;">
  <p>Hello {name},</p>
  <p>Your sign-in verification code is:</p>
  <p style="font-size: 24px; letter-spacing: 4px;"><strong>{code}</strong></p>
  <p>The code expires in 10 minutes. If you did not try to sign in, ignore this message.</p>
</div>"#,
            name = escape_html(name),
            code = escape_html(code),
        ),
    }
}

pub fn password_reset_link(to: &str, name: &str, link: &str) -> OutgoingMail {
    let link = escape_html(link);
    OutgoingMail {
        to: to.to_string(),
        subject: "Password reset request".to_string(),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; color: #333;">
  <p>Hello {name},</p>
  <p>We received a request to reset your password. Use the link below within the next 20 hours:</p>
  <p><a href="{link}">{link}</a></p>
  <p>If you did not request a reset, you can ignore this message.</p>
</div>"#,
            name = escape_html(name),
            link = link,
        ),
    }
}

pub fn password_changed(to: &str, name: &str) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Your password was changed".to_string(),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; color: #333;">
  <p>Hello {name},</p>
  <p>Your password was changed successfully. If this was not you, contact an administrator immediately.</p>
</div>"#,
            name = escape_html(name),
        ),
    }
}
