//! # 颜色解析模块
//!
//! 支持的写法（忽略大小写与首尾空白）：
//! - 颜色名：CSS/X11 颜色表，如 `black`、`red`、`darkslategray`
//! - 十六进制：`#rgb`、`#rgba`、`#rrggbb`、`#rrggbbaa`（alpha 在不透明画布上无意义，忽略）
//! - 函数式：`rgb(255, 0, 0)`、`rgb(100%, 0%, 0%)`、`rgba(255, 0, 0, 128)`
//! - 色相式：`hsl(0, 100%, 50%)`、`hsv(240, 100%, 100%)`（`hsb` 同 `hsv`）

use image::Rgb;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

use super::ProcessingError;

static RGB_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgb\(\s*(\d{1,3})(%?)\s*,\s*(\d{1,3})(%?)\s*,\s*(\d{1,3})(%?)\s*\)$")
        .expect("rgb() pattern is valid")
});

static RGBA_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgba\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)$")
        .expect("rgba() pattern is valid")
});

static HSL_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^hsl\(\s*(\d+\.?\d*)\s*,\s*(\d+\.?\d*)%\s*,\s*(\d+\.?\d*)%\s*\)$")
        .expect("hsl() pattern is valid")
});

static HSV_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^hs[bv]\(\s*(\d+\.?\d*)\s*,\s*(\d+\.?\d*)%\s*,\s*(\d+\.?\d*)%\s*\)$")
        .expect("hsv() pattern is valid")
});

static NAMED_COLORS: Lazy<HashMap<&'static str, [u8; 3]>> = Lazy::new(|| {
    [
        ("aliceblue", [240, 248, 255]), ("antiquewhite", [250, 235, 215]), ("aqua", [0, 255, 255]),
        ("aquamarine", [127, 255, 212]), ("azure", [240, 255, 255]), ("beige", [245, 245, 220]),
        ("bisque", [255, 228, 196]), ("black", [0, 0, 0]), ("blanchedalmond", [255, 235, 205]),
        ("blue", [0, 0, 255]), ("blueviolet", [138, 43, 226]), ("brown", [165, 42, 42]),
        ("burlywood", [222, 184, 135]), ("cadetblue", [95, 158, 160]), ("chartreuse", [127, 255, 0]),
        ("chocolate", [210, 105, 30]), ("coral", [255, 127, 80]), ("cornflowerblue", [100, 149, 237]),
        ("cornsilk", [255, 248, 220]), ("crimson", [220, 20, 60]), ("cyan", [0, 255, 255]),
        ("darkblue", [0, 0, 139]), ("darkcyan", [0, 139, 139]), ("darkgoldenrod", [184, 134, 11]),
        ("darkgray", [169, 169, 169]), ("darkgrey", [169, 169, 169]), ("darkgreen", [0, 100, 0]),
        ("darkkhaki", [189, 183, 107]), ("darkmagenta", [139, 0, 139]), ("darkolivegreen", [85, 107, 47]),
        ("darkorange", [255, 140, 0]), ("darkorchid", [153, 50, 204]), ("darkred", [139, 0, 0]),
        ("darksalmon", [233, 150, 122]), ("darkseagreen", [143, 188, 143]), ("darkslateblue", [72, 61, 139]),
        ("darkslategray", [47, 79, 79]), ("darkslategrey", [47, 79, 79]), ("darkturquoise", [0, 206, 209]),
        ("darkviolet", [148, 0, 211]), ("deeppink", [255, 20, 147]), ("deepskyblue", [0, 191, 255]),
        ("dimgray", [105, 105, 105]), ("dimgrey", [105, 105, 105]), ("dodgerblue", [30, 144, 255]),
        ("firebrick", [178, 34, 34]), ("floralwhite", [255, 250, 240]), ("forestgreen", [34, 139, 34]),
        ("fuchsia", [255, 0, 255]), ("gainsboro", [220, 220, 220]), ("ghostwhite", [248, 248, 255]),
        ("gold", [255, 215, 0]), ("goldenrod", [218, 165, 32]), ("gray", [128, 128, 128]),
        ("grey", [128, 128, 128]), ("green", [0, 128, 0]), ("greenyellow", [173, 255, 47]),
        ("honeydew", [240, 255, 240]), ("hotpink", [255, 105, 180]), ("indianred", [205, 92, 92]),
        ("indigo", [75, 0, 130]), ("ivory", [255, 255, 240]), ("khaki", [240, 230, 140]),
        ("lavender", [230, 230, 250]), ("lavenderblush", [255, 240, 245]), ("lawngreen", [124, 252, 0]),
        ("lemonchiffon", [255, 250, 205]), ("lightblue", [173, 216, 230]), ("lightcoral", [240, 128, 128]),
        ("lightcyan", [224, 255, 255]), ("lightgoldenrodyellow", [250, 250, 210]), ("lightgreen", [144, 238, 144]),
        ("lightgray", [211, 211, 211]), ("lightgrey", [211, 211, 211]), ("lightpink", [255, 182, 193]),
        ("lightsalmon", [255, 160, 122]), ("lightseagreen", [32, 178, 170]), ("lightskyblue", [135, 206, 250]),
        ("lightslategray", [119, 136, 153]), ("lightslategrey", [119, 136, 153]), ("lightsteelblue", [176, 196, 222]),
        ("lightyellow", [255, 255, 224]), ("lime", [0, 255, 0]), ("limegreen", [50, 205, 50]),
        ("linen", [250, 240, 230]), ("magenta", [255, 0, 255]), ("maroon", [128, 0, 0]),
        ("mediumaquamarine", [102, 205, 170]), ("mediumblue", [0, 0, 205]), ("mediumorchid", [186, 85, 211]),
        ("mediumpurple", [147, 112, 219]), ("mediumseagreen", [60, 179, 113]), ("mediumslateblue", [123, 104, 238]),
        ("mediumspringgreen", [0, 250, 154]), ("mediumturquoise", [72, 209, 204]), ("mediumvioletred", [199, 21, 133]),
        ("midnightblue", [25, 25, 112]), ("mintcream", [245, 255, 250]), ("mistyrose", [255, 228, 225]),
        ("moccasin", [255, 228, 181]), ("navajowhite", [255, 222, 173]), ("navy", [0, 0, 128]),
        ("oldlace", [253, 245, 230]), ("olive", [128, 128, 0]), ("olivedrab", [107, 142, 35]),
        ("orange", [255, 165, 0]), ("orangered", [255, 69, 0]), ("orchid", [218, 112, 214]),
        ("palegoldenrod", [238, 232, 170]), ("palegreen", [152, 251, 152]), ("paleturquoise", [175, 238, 238]),
        ("palevioletred", [219, 112, 147]), ("papayawhip", [255, 239, 213]), ("peachpuff", [255, 218, 185]),
        ("peru", [205, 133, 63]), ("pink", [255, 192, 203]), ("plum", [221, 160, 221]),
        ("powderblue", [176, 224, 230]), ("purple", [128, 0, 128]), ("rebeccapurple", [102, 51, 153]),
        ("red", [255, 0, 0]), ("rosybrown", [188, 143, 143]), ("royalblue", [65, 105, 225]),
        ("saddlebrown", [139, 69, 19]), ("salmon", [250, 128, 114]), ("sandybrown", [244, 164, 96]),
        ("seagreen", [46, 139, 87]), ("seashell", [255, 245, 238]), ("sienna", [160, 82, 45]),
        ("silver", [192, 192, 192]), ("skyblue", [135, 206, 235]), ("slateblue", [106, 90, 205]),
        ("slategray", [112, 128, 144]), ("slategrey", [112, 128, 144]), ("snow", [255, 250, 250]),
        ("springgreen", [0, 255, 127]), ("steelblue", [70, 130, 180]), ("tan", [210, 180, 140]),
        ("teal", [0, 128, 128]), ("thistle", [216, 191, 216]), ("tomato", [255, 99, 71]),
        ("turquoise", [64, 224, 208]), ("violet", [238, 130, 238]), ("wheat", [245, 222, 179]),
        ("white", [255, 255, 255]), ("whitesmoke", [245, 245, 245]), ("yellow", [255, 255, 0]),
        ("yellowgreen", [154, 205, 50]),
    ]
    .into_iter()
    .collect()
});

/// 将颜色描述解析为 RGB。
pub fn parse_color(spec: &str) -> Result<Rgb<u8>, ProcessingError> {
    let normalized = spec.trim().to_ascii_lowercase();

    if let Some(hex) = normalized.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| unknown(spec));
    }

    if let Some(caps) = RGB_FUNCTION.captures(&normalized) {
        let mut channels = [0u8; 3];
        for (i, channel) in channels.iter_mut().enumerate() {
            let value: u32 = caps[1 + i * 2].parse().map_err(|_| unknown(spec))?;
            let percent = !caps[2 + i * 2].is_empty();
            *channel = if percent {
                if value > 100 {
                    return Err(unknown(spec));
                }
                ((value * 255 + 50) / 100) as u8
            } else {
                u8::try_from(value).map_err(|_| unknown(spec))?
            };
        }
        return Ok(Rgb(channels));
    }

    if let Some(caps) = RGBA_FUNCTION.captures(&normalized) {
        let mut channels = [0u8; 3];
        for (i, channel) in channels.iter_mut().enumerate() {
            *channel = caps[1 + i].parse().map_err(|_| unknown(spec))?;
        }
        // alpha 需合法，但在不透明画布上忽略
        caps[4].parse::<u8>().map_err(|_| unknown(spec))?;
        return Ok(Rgb(channels));
    }

    if let Some(caps) = HSL_FUNCTION.captures(&normalized) {
        let [h, s, l] = float_triplet(&caps).ok_or_else(|| unknown(spec))?;
        return Ok(unit_to_rgb(hls_to_rgb(h / 360.0, l / 100.0, s / 100.0)));
    }

    if let Some(caps) = HSV_FUNCTION.captures(&normalized) {
        let [h, s, v] = float_triplet(&caps).ok_or_else(|| unknown(spec))?;
        return Ok(unit_to_rgb(hsv_to_rgb(h / 360.0, s / 100.0, v / 100.0)));
    }

    NAMED_COLORS
        .get(normalized.as_str())
        .map(|rgb| Rgb(*rgb))
        .ok_or_else(|| unknown(spec))
}

fn parse_hex(hex: &str) -> Option<Rgb<u8>> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        3 | 4 => {
            let mut channels = [0u8; 3];
            for (i, c) in hex.chars().take(3).enumerate() {
                let v = c.to_digit(16)? as u8;
                channels[i] = v * 17;
            }
            Some(Rgb(channels))
        }
        6 | 8 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb([r, g, b]))
        }
        _ => None,
    }
}

fn float_triplet(caps: &Captures<'_>) -> Option<[f64; 3]> {
    Some([
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    ])
}

fn unit_to_rgb(channels: [f64; 3]) -> Rgb<u8> {
    Rgb(channels.map(|c| (c * 255.0 + 0.5).clamp(0.0, 255.0) as u8))
}

fn hls_to_rgb(h: f64, l: f64, s: f64) -> [f64; 3] {
    if s == 0.0 {
        return [l, l, l];
    }
    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;
    [
        hue_channel(m1, m2, h + 1.0 / 3.0),
        hue_channel(m1, m2, h),
        hue_channel(m1, m2, h - 1.0 / 3.0),
    ]
}

fn hue_channel(m1: f64, m2: f64, hue: f64) -> f64 {
    let hue = hue.rem_euclid(1.0);
    if hue < 1.0 / 6.0 {
        m1 + (m2 - m1) * hue * 6.0
    } else if hue < 0.5 {
        m2
    } else if hue < 2.0 / 3.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
    } else {
        m1
    }
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [f64; 3] {
    if s == 0.0 {
        return [v, v, v];
    }
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match (sector as i64).rem_euclid(6) {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

fn unknown(spec: &str) -> ProcessingError {
    ProcessingError::InvalidColor(format!("无法识别的颜色：{}", spec))
}
