//! Display formatting for reals and complex numbers in results.

use num_complex::Complex64;

/// Digits kept after the decimal point when a value is not (close to) an integer.
const DISPLAY_DECIMALS: usize = 6;

/// Format a real for display: near-integers print as integers, others with up to six
/// decimals and no trailing zeros. Never prints "-0".
pub fn format_real(v: f64) -> String {
    let rounded = v.round();
    if (v - rounded).abs() <= 1e-9 * v.abs().max(1.0) {
        if rounded == 0.0 {
            return "0".to_string();
        }
        return format!("{rounded}");
    }
    let s = format!("{:.*}", DISPLAY_DECIMALS, v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Format a complex value: "1", "2i", "-i", "1 + 2i", "0.5 - 1.5i".
pub fn format_complex(z: Complex64) -> String {
    let re = format_real(z.re);
    let im = format_real(z.im);
    if im == "0" {
        return re;
    }
    let magnitude = format_real(z.im.abs());
    let imag = if magnitude == "1" {
        "i".to_string()
    } else {
        format!("{magnitude}i")
    };
    if re == "0" {
        if z.im < 0.0 {
            format!("-{imag}")
        } else {
            imag
        }
    } else if z.im < 0.0 {
        format!("{re} - {imag}")
    } else {
        format!("{re} + {imag}")
    }
}
