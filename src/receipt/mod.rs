//! Receipt

use std::{fmt::Write, io};

use smallvec::{SmallVec, smallvec};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{CartLine, LineKey},
    orders::Order,
    pricing::PriceBreakdown,
};

/// Errors that can occur when rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// A line total overflowed.
    #[error("line total overflowed for {0}")]
    LineTotal(LineKey),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Printable summary of priced cart lines.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    lines: &'a [CartLine],
    pricing: PriceBreakdown,
    coupon_code: Option<&'a str>,
    heading: Option<String>,
}

impl<'a> Receipt<'a> {
    /// Receipt for cart lines priced together.
    pub fn new(lines: &'a [CartLine], pricing: PriceBreakdown) -> Self {
        Self {
            lines,
            pricing,
            coupon_code: None,
            heading: None,
        }
    }

    /// Receipt for a placed order.
    pub fn for_order(order: &'a Order) -> Self {
        Self {
            lines: order.lines(),
            pricing: *order.pricing(),
            coupon_code: order.coupon_code(),
            heading: Some(format!("Order {} ({})", order.id(), order.status())),
        }
    }

    /// Name the coupon on the discount line.
    #[must_use]
    pub fn with_coupon(mut self, code: Option<&'a str>) -> Self {
        self.coupon_code = code;
        self
    }

    /// Lines on the receipt.
    pub fn lines(&self) -> &'a [CartLine] {
        self.lines
    }

    /// Price breakdown on the receipt.
    pub fn pricing(&self) -> &PriceBreakdown {
        &self.pricing
    }

    /// Writes the receipt as a table followed by the totals.
    ///
    /// # Errors
    ///
    /// Returns an error if a line total overflows or the output cannot be
    /// written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        if let Some(heading) = &self.heading {
            writeln!(out, "\n \x1b[1m{heading}\x1b[0m").map_err(|_err| ReceiptError::IO)?;
        }

        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Variant", "Unit Price", "Qty", "Total"]);

        let mut color_ops: SmallVec<[(usize, usize, Color); 32]> = smallvec![];

        for (idx, line) in self.lines.iter().enumerate() {
            let total = line
                .line_total()
                .ok_or_else(|| ReceiptError::LineTotal(line.key().clone()))?;

            builder.push_record([
                format!("#{:<3}", idx + 1),
                line.name().to_string(),
                line.variant().unwrap_or_default().to_string(),
                format!("{}", line.unit_price()),
                line.quantity().to_string(),
                format!("{total}"),
            ]);

            color_ops.push((idx + 1, 0, color_dark_grey()));
            color_ops.push((idx + 1, 2, color_dark_grey()));
        }

        write_receipt_table(&mut out, builder, color_ops)?;

        write_receipt_summary(&mut out, self)
    }
}

fn write_receipt_table(
    out: &mut impl io::Write,
    builder: Builder,
    color_ops: SmallVec<[(usize, usize, Color); 32]>,
) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..6), Alignment::right());

    for (row, col, color) in color_ops {
        table.modify((row, col), color);
    }

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

fn write_receipt_summary(out: &mut impl io::Write, receipt: &Receipt<'_>) -> Result<(), ReceiptError> {
    let pricing = &receipt.pricing;

    let delivery = if pricing.has_free_delivery() {
        "FREE".to_string()
    } else {
        format!("{}", pricing.delivery_fee())
    };

    let coupon_label = match receipt.coupon_code {
        Some(code) => format!(" Coupon ({code}):"),
        None => " Coupon:".to_string(),
    };

    let mut rows: SmallVec<[(String, String); 6]> = smallvec![
        (" Subtotal:".to_string(), format!("{}  ", pricing.subtotal())),
        (" Delivery:".to_string(), format!("{delivery}  ")),
    ];

    if pricing.coupon_discount().to_minor_units() > 0 {
        rows.push((coupon_label, format!("-{}  ", pricing.coupon_discount())));
    }

    if pricing.wallet_deduction().to_minor_units() > 0 {
        rows.push((
            " Wallet:".to_string(),
            format!("-{}  ", pricing.wallet_deduction()),
        ));
    }

    rows.push((
        " \x1b[1mTotal:\x1b[0m".to_string(),
        format!("\x1b[1m{}  \x1b[0m", pricing.total()),
    ));

    if pricing.savings().to_minor_units() > 0 {
        rows.push((" Savings:".to_string(), format!("{}  ", pricing.savings())));
    }

    let label_width = rows
        .iter()
        .map(|(label, _)| visible_width(label))
        .max()
        .unwrap_or_default();

    let value_width = rows
        .iter()
        .map(|(_, value)| visible_width(value))
        .max()
        .unwrap_or_default();

    for (label, value) in &rows {
        write_summary_line(out, label, value, label_width, value_width)?;
    }

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

/// Wraps runs of box-drawing characters (U+2500..U+257F) in dark grey.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

/// ANSI dark grey foreground.
fn color_dark_grey() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}
