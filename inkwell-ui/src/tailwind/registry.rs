//! Utility class resolution.
//!
//! Covers the vocabulary generated layouts actually use. Anything else
//! resolves to `None` and is skipped.

#[derive(Debug, Clone, PartialEq)]
pub struct CssRule {
    pub selector: String,
    pub declarations: Vec<(String, String)>,
    pub media_query: Option<String>,
}

impl CssRule {
    fn fixed(class: &str, props: &[(&str, &str)]) -> Self {
        Self::with(
            class,
            props.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        )
    }

    fn with(class: &str, declarations: Vec<(String, String)>) -> Self {
        Self {
            selector: format!(".{}", escape_selector(class)),
            declarations,
            media_query: None,
        }
    }

    fn each(class: &str, props: &[&str], value: String) -> Self {
        Self::with(
            class,
            props.iter().map(|p| (p.to_string(), value.clone())).collect(),
        )
    }
}

pub(crate) fn escape_selector(class: &str) -> String {
    let mut out = String::with_capacity(class.len() + 4);
    for ch in class.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}

/// Resolves one utility class (without variants).
pub fn resolve_class(class: &str) -> Option<CssRule> {
    resolve_layout(class)
        .or_else(|| resolve_flex_grid(class))
        .or_else(|| resolve_alignment(class))
        .or_else(|| resolve_spacing(class))
        .or_else(|| resolve_sizing(class))
        .or_else(|| resolve_typography(class))
        .or_else(|| resolve_border(class))
        .or_else(|| resolve_effects(class))
        .or_else(|| resolve_color(class))
}

fn resolve_layout(class: &str) -> Option<CssRule> {
    let (prop, value) = match class {
        "block" => ("display", "block"),
        "inline-block" => ("display", "inline-block"),
        "inline" => ("display", "inline"),
        "flex" => ("display", "flex"),
        "inline-flex" => ("display", "inline-flex"),
        "grid" => ("display", "grid"),
        "hidden" => ("display", "none"),
        "relative" | "absolute" | "fixed" | "sticky" | "static" => ("position", class),
        "inset-0" => return Some(CssRule::fixed(class, &[("inset", "0")])),
        "overflow-hidden" => ("overflow", "hidden"),
        "overflow-auto" => ("overflow", "auto"),
        "overflow-x-auto" => ("overflow-x", "auto"),
        "overflow-y-auto" => ("overflow-y", "auto"),
        "cursor-pointer" => ("cursor", "pointer"),
        "pointer-events-none" => ("pointer-events", "none"),
        "pointer-events-auto" => ("pointer-events", "auto"),
        _ => {
            let z = class.strip_prefix("z-")?;
            z.parse::<i32>().ok()?;
            return Some(CssRule::with(class, vec![("z-index".into(), z.into())]));
        }
    };
    Some(CssRule::fixed(class, &[(prop, value)]))
}

fn resolve_flex_grid(class: &str) -> Option<CssRule> {
    let rule = match class {
        "flex-row" => CssRule::fixed(class, &[("flex-direction", "row")]),
        "flex-col" => CssRule::fixed(class, &[("flex-direction", "column")]),
        "flex-wrap" => CssRule::fixed(class, &[("flex-wrap", "wrap")]),
        "flex-1" => CssRule::fixed(class, &[("flex", "1 1 0%")]),
        "flex-auto" => CssRule::fixed(class, &[("flex", "1 1 auto")]),
        "flex-none" => CssRule::fixed(class, &[("flex", "none")]),
        "grow" => CssRule::fixed(class, &[("flex-grow", "1")]),
        "shrink-0" => CssRule::fixed(class, &[("flex-shrink", "0")]),
        "col-span-full" => CssRule::fixed(class, &[("grid-column", "1 / -1")]),
        _ => {
            if let Some(n) = class.strip_prefix("grid-cols-") {
                let n: u8 = n.parse().ok().filter(|n| (1..=12).contains(n))?;
                return Some(CssRule::with(
                    class,
                    vec![(
                        "grid-template-columns".into(),
                        format!("repeat({}, minmax(0, 1fr))", n),
                    )],
                ));
            }
            if let Some(n) = class.strip_prefix("col-span-") {
                let n: u8 = n.parse().ok().filter(|n| (1..=12).contains(n))?;
                return Some(CssRule::with(
                    class,
                    vec![("grid-column".into(), format!("span {} / span {}", n, n))],
                ));
            }
            return None;
        }
    };
    Some(rule)
}

fn resolve_alignment(class: &str) -> Option<CssRule> {
    let (prop, value) = match class {
        "items-start" => ("align-items", "flex-start"),
        "items-end" => ("align-items", "flex-end"),
        "items-center" => ("align-items", "center"),
        "items-stretch" => ("align-items", "stretch"),
        "justify-start" => ("justify-content", "flex-start"),
        "justify-end" => ("justify-content", "flex-end"),
        "justify-center" => ("justify-content", "center"),
        "justify-between" => ("justify-content", "space-between"),
        "justify-around" => ("justify-content", "space-around"),
        "self-center" => ("align-self", "center"),
        "place-items-center" => ("place-items", "center"),
        _ => {
            if let Some(v) = class.strip_prefix("gap-x-") {
                return Some(CssRule::each(class, &["column-gap"], spacing_value(v)?));
            }
            if let Some(v) = class.strip_prefix("gap-y-") {
                return Some(CssRule::each(class, &["row-gap"], spacing_value(v)?));
            }
            if let Some(v) = class.strip_prefix("gap-") {
                return Some(CssRule::each(class, &["gap"], spacing_value(v)?));
            }
            for (prefix, prop) in [("space-x-", "margin-left"), ("space-y-", "margin-top")] {
                if let Some(v) = class.strip_prefix(prefix) {
                    let mut rule = CssRule::each(class, &[prop], spacing_value(v)?);
                    rule.selector.push_str(" > * + *");
                    return Some(rule);
                }
            }
            return None;
        }
    };
    Some(CssRule::fixed(class, &[(prop, value)]))
}

const SPACING_PREFIXES: &[(&str, &[&str])] = &[
    ("px-", &["padding-left", "padding-right"]),
    ("py-", &["padding-top", "padding-bottom"]),
    ("pt-", &["padding-top"]),
    ("pr-", &["padding-right"]),
    ("pb-", &["padding-bottom"]),
    ("pl-", &["padding-left"]),
    ("p-", &["padding"]),
    ("mx-", &["margin-left", "margin-right"]),
    ("my-", &["margin-top", "margin-bottom"]),
    ("mt-", &["margin-top"]),
    ("mr-", &["margin-right"]),
    ("mb-", &["margin-bottom"]),
    ("ml-", &["margin-left"]),
    ("m-", &["margin"]),
];

fn resolve_spacing(class: &str) -> Option<CssRule> {
    let (negative, rest) = match class.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, class),
    };
    let (props, token) = SPACING_PREFIXES
        .iter()
        .find_map(|(prefix, props)| rest.strip_prefix(prefix).map(|t| (*props, t)))?;
    let is_padding = props[0].starts_with("padding");

    if token == "auto" {
        if is_padding || negative {
            return None;
        }
        return Some(CssRule::each(class, props, "auto".into()));
    }
    if negative && is_padding {
        return None;
    }
    let value = spacing_value(token)?;
    let value = if negative && value != "0" {
        format!("-{}", value)
    } else {
        value
    };
    Some(CssRule::each(class, props, value))
}

fn resolve_sizing(class: &str) -> Option<CssRule> {
    if let Some(v) = class.strip_prefix("max-w-") {
        let value = match v {
            "none" => "none".to_string(),
            "full" => "100%".to_string(),
            "prose" => "65ch".to_string(),
            _ => container_size(v)?.to_string(),
        };
        return Some(CssRule::each(class, &["max-width"], value));
    }
    if let Some(v) = class.strip_prefix("min-h-") {
        let value = match v {
            "screen" => "100vh".to_string(),
            "full" => "100%".to_string(),
            _ => spacing_value(v)?,
        };
        return Some(CssRule::each(class, &["min-height"], value));
    }
    for (prefix, props, screen) in [
        ("w-", &["width"][..], "100vw"),
        ("h-", &["height"][..], "100vh"),
        ("size-", &["width", "height"][..], "100vw"),
    ] {
        if let Some(v) = class.strip_prefix(prefix) {
            let value = match v {
                "auto" => "auto".to_string(),
                "full" => "100%".to_string(),
                "screen" => screen.to_string(),
                "fit" => "fit-content".to_string(),
                _ => fraction(v).or_else(|| spacing_value(v))?,
            };
            return Some(CssRule::each(class, props, value));
        }
    }
    None
}

fn resolve_typography(class: &str) -> Option<CssRule> {
    let rule = match class {
        "text-xs" => CssRule::fixed(class, &[("font-size", "0.75rem"), ("line-height", "1rem")]),
        "text-sm" => CssRule::fixed(class, &[("font-size", "0.875rem"), ("line-height", "1.25rem")]),
        "text-base" => CssRule::fixed(class, &[("font-size", "1rem"), ("line-height", "1.5rem")]),
        "text-lg" => CssRule::fixed(class, &[("font-size", "1.125rem"), ("line-height", "1.75rem")]),
        "text-xl" => CssRule::fixed(class, &[("font-size", "1.25rem"), ("line-height", "1.75rem")]),
        "text-2xl" => CssRule::fixed(class, &[("font-size", "1.5rem"), ("line-height", "2rem")]),
        "text-3xl" => CssRule::fixed(class, &[("font-size", "1.875rem"), ("line-height", "2.25rem")]),
        "text-4xl" => CssRule::fixed(class, &[("font-size", "2.25rem"), ("line-height", "2.5rem")]),
        "text-5xl" => CssRule::fixed(class, &[("font-size", "3rem"), ("line-height", "1")]),
        "text-left" | "text-center" | "text-right" => {
            CssRule::fixed(class, &[("text-align", &class[5..])])
        }
        "font-light" => CssRule::fixed(class, &[("font-weight", "300")]),
        "font-normal" => CssRule::fixed(class, &[("font-weight", "400")]),
        "font-medium" => CssRule::fixed(class, &[("font-weight", "500")]),
        "font-semibold" => CssRule::fixed(class, &[("font-weight", "600")]),
        "font-bold" => CssRule::fixed(class, &[("font-weight", "700")]),
        "font-mono" => CssRule::fixed(class, &[("font-family", "ui-monospace, monospace")]),
        "uppercase" => CssRule::fixed(class, &[("text-transform", "uppercase")]),
        "underline" => CssRule::fixed(class, &[("text-decoration-line", "underline")]),
        "leading-tight" => CssRule::fixed(class, &[("line-height", "1.25")]),
        "leading-relaxed" => CssRule::fixed(class, &[("line-height", "1.625")]),
        "tracking-tight" => CssRule::fixed(class, &[("letter-spacing", "-0.025em")]),
        "truncate" => CssRule::fixed(
            class,
            &[
                ("overflow", "hidden"),
                ("text-overflow", "ellipsis"),
                ("white-space", "nowrap"),
            ],
        ),
        _ => return None,
    };
    Some(rule)
}

fn resolve_border(class: &str) -> Option<CssRule> {
    let rule = match class {
        "border" => CssRule::fixed(class, &[("border-width", "1px"), ("border-style", "solid")]),
        "border-0" => CssRule::fixed(class, &[("border-width", "0")]),
        "border-2" => CssRule::fixed(class, &[("border-width", "2px"), ("border-style", "solid")]),
        "border-t" => CssRule::fixed(class, &[("border-top-width", "1px"), ("border-top-style", "solid")]),
        "border-b" => CssRule::fixed(class, &[("border-bottom-width", "1px"), ("border-bottom-style", "solid")]),
        "rounded-none" => CssRule::fixed(class, &[("border-radius", "0")]),
        "rounded-sm" => CssRule::fixed(class, &[("border-radius", "0.125rem")]),
        "rounded" => CssRule::fixed(class, &[("border-radius", "0.25rem")]),
        "rounded-md" => CssRule::fixed(class, &[("border-radius", "0.375rem")]),
        "rounded-lg" => CssRule::fixed(class, &[("border-radius", "0.5rem")]),
        "rounded-xl" => CssRule::fixed(class, &[("border-radius", "0.75rem")]),
        "rounded-2xl" => CssRule::fixed(class, &[("border-radius", "1rem")]),
        "rounded-full" => CssRule::fixed(class, &[("border-radius", "9999px")]),
        _ => return None,
    };
    Some(rule)
}

fn resolve_effects(class: &str) -> Option<CssRule> {
    let shadow = match class {
        "shadow-sm" => "0 1px 2px 0 rgba(0, 0, 0, 0.05)",
        "shadow" => "0 1px 3px 0 rgba(0, 0, 0, 0.1), 0 1px 2px -1px rgba(0, 0, 0, 0.1)",
        "shadow-md" => "0 4px 6px -1px rgba(0, 0, 0, 0.1), 0 2px 4px -2px rgba(0, 0, 0, 0.1)",
        "shadow-lg" => "0 10px 15px -3px rgba(0, 0, 0, 0.1), 0 4px 6px -4px rgba(0, 0, 0, 0.1)",
        "shadow-none" => "none",
        _ => {
            let pct: u8 = class.strip_prefix("opacity-")?.parse().ok().filter(|p| *p <= 100)?;
            return Some(CssRule::with(
                class,
                vec![("opacity".into(), format_alpha(f64::from(pct) / 100.0))],
            ));
        }
    };
    Some(CssRule::fixed(class, &[("box-shadow", shadow)]))
}

fn resolve_color(class: &str) -> Option<CssRule> {
    let (prop, token) = if let Some(t) = class.strip_prefix("bg-") {
        ("background-color", t)
    } else if let Some(t) = class.strip_prefix("text-") {
        ("color", t)
    } else if let Some(t) = class.strip_prefix("border-") {
        ("border-color", t)
    } else {
        return None;
    };
    Some(CssRule::each(class, &[prop], color_value(token)?))
}

/// `blue-500`, `black/10`, `white`, `transparent`.
fn color_value(token: &str) -> Option<String> {
    let (name, alpha) = match token.split_once('/') {
        Some((name, pct)) => {
            let pct: u8 = pct.parse().ok().filter(|p| *p <= 100)?;
            (name, Some(f64::from(pct) / 100.0))
        }
        None => (token, None),
    };
    let hex = match name {
        "transparent" => return alpha.is_none().then(|| "transparent".to_string()),
        "current" => return alpha.is_none().then(|| "currentColor".to_string()),
        "black" => "#000000",
        "white" => "#ffffff",
        _ => {
            let (family, shade) = name.rsplit_once('-')?;
            palette_lookup(family, shade.parse().ok()?)?
        }
    };
    match alpha {
        None => Some(hex.to_string()),
        Some(a) => {
            let (r, g, b) = hex_to_rgb(hex)?;
            Some(format!("rgba({}, {}, {}, {})", r, g, b, format_alpha(a)))
        }
    }
}

const SHADES: [u16; 11] = [50, 100, 200, 300, 400, 500, 600, 700, 800, 900, 950];

const PALETTE: &[(&str, [&str; 11])] = &[
    ("gray", ["#f9fafb", "#f3f4f6", "#e5e7eb", "#d1d5db", "#9ca3af", "#6b7280", "#4b5563", "#374151", "#1f2937", "#111827", "#030712"]),
    ("neutral", ["#fafafa", "#f5f5f5", "#e5e5e5", "#d4d4d4", "#a3a3a3", "#737373", "#525252", "#404040", "#262626", "#171717", "#0a0a0a"]),
    ("slate", ["#f8fafc", "#f1f5f9", "#e2e8f0", "#cbd5e1", "#94a3b8", "#64748b", "#475569", "#334155", "#1e293b", "#0f172a", "#020617"]),
    ("red", ["#fef2f2", "#fee2e2", "#fecaca", "#fca5a5", "#f87171", "#ef4444", "#dc2626", "#b91c1c", "#991b1b", "#7f1d1d", "#450a0a"]),
    ("green", ["#f0fdf4", "#dcfce7", "#bbf7d0", "#86efac", "#4ade80", "#22c55e", "#16a34a", "#15803d", "#166534", "#14532d", "#052e16"]),
    ("blue", ["#eff6ff", "#dbeafe", "#bfdbfe", "#93c5fd", "#60a5fa", "#3b82f6", "#2563eb", "#1d4ed8", "#1e40af", "#1e3a8a", "#172554"]),
    ("indigo", ["#eef2ff", "#e0e7ff", "#c7d2fe", "#a5b4fc", "#818cf8", "#6366f1", "#4f46e5", "#4338ca", "#3730a3", "#312e81", "#1e1b4b"]),
];

fn palette_lookup(family: &str, shade: u16) -> Option<&'static str> {
    let idx = SHADES.iter().position(|s| *s == shade)?;
    PALETTE
        .iter()
        .find(|(name, _)| *name == family)
        .map(|(_, shades)| shades[idx])
}

fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let h = hex.strip_prefix('#')?;
    if h.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&h[0..2], 16).ok()?;
    let g = u8::from_str_radix(&h[2..4], 16).ok()?;
    let b = u8::from_str_radix(&h[4..6], 16).ok()?;
    Some((r, g, b))
}

fn format_alpha(a: f64) -> String {
    let s = format!("{:.2}", a);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Spacing scale: one step is 0.25rem; `0`, `px` and half steps allowed.
fn spacing_value(token: &str) -> Option<String> {
    match token {
        "0" => return Some("0".into()),
        "px" => return Some("1px".into()),
        _ => {}
    }
    if token.starts_with('[') && token.ends_with(']') && token.len() > 2 {
        return Some(token[1..token.len() - 1].replace('_', " "));
    }
    let n: f64 = token.parse().ok()?;
    if n < 0.0 || n > 96.0 || (n * 2.0).fract() != 0.0 {
        return None;
    }
    Some(format!("{}rem", n * 0.25))
}

fn fraction(token: &str) -> Option<String> {
    let (num, den) = token.split_once('/')?;
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    if den == 0.0 {
        return None;
    }
    let pct = format!("{:.6}", num / den * 100.0);
    Some(format!("{}%", pct.trim_end_matches('0').trim_end_matches('.')))
}

fn container_size(token: &str) -> Option<&'static str> {
    Some(match token {
        "xs" => "20rem",
        "sm" => "24rem",
        "md" => "28rem",
        "lg" => "32rem",
        "xl" => "36rem",
        "2xl" => "42rem",
        "3xl" => "48rem",
        "4xl" => "56rem",
        "5xl" => "64rem",
        "6xl" => "72rem",
        "7xl" => "80rem",
        _ => return None,
    })
}
