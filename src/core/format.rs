//! 巴西格式的數值輸出與資料集數值欄位解析

/// `R$ 1.234,50`：千分位用 `.`，小數點用 `,`，固定兩位小數
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (sign, digits) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (integer, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    format!("R$ {}{},{}", sign, group_thousands(integer), fraction)
}

fn group_thousands(integer: &str) -> String {
    let len = integer.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

/// 資料集中的數值欄位（AREA、PESO UND、A VISTA）轉成數值；
/// 小數逗號視為小數點，空白或無法解析時回傳 0
pub fn parse_decimal(raw: &str) -> f64 {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|area| area.is_finite())
        .unwrap_or(0.0)
}

/// 一般浮點數輸出：整數值保留一位小數（`100.0`），其他用最短表示（`120.5`）
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// 折扣百分比：整數折扣不帶小數（`(5%)`）
pub fn format_percent(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("({:.0}%)", value)
    } else {
        format!("({}%)", value)
    }
}
