// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use colored::*;
use kdam::{Bar, tqdm};

/// A basic progress bar for tracking iterations
pub fn progress_bar(n: usize, desc: &str, verbose: bool) -> Bar {
    if !verbose {
        return tqdm!(disable = true);
    }

    tqdm!(
        total = n,
        force_refresh = false,
        desc = progress_timestamp(desc),
        bar_format =
            "{desc suffix=' '}[{percentage:.0}%] ({rate:.1}/s, eta: {remaining human=true})"
    )
}

/// A progress prefix with a standardized timestamp for tracking time
pub fn progress_timestamp(desc: &str) -> String {
    let time = chrono::Local::now();
    let ymd = time.format("%Y-%m-%d").to_string();
    let hms = time.format("%H:%M:%S").to_string();
    let time = format!("{} | {}", ymd, hms);

    format!(
        "{} {} {} {} {} {}",
        "[".bold(),
        time,
        "|".bold(),
        "sorrel".truecolor(156, 60, 60).bold(),
        "]".bold(),
        desc,
    )
}

/// Print timestamped statements to console
pub fn progress_log(desc: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!("{}", progress_timestamp(desc));
}

/// Format numbers to readable thousands format
///
/// ```
/// use sorrel_core::ut::track::thousands_format;
///
/// assert_eq!(thousands_format(100), "100");
/// assert_eq!(thousands_format(1234), "1234");
/// assert_eq!(thousands_format(1234567), "1,234,567");
/// ```
pub fn thousands_format<T>(number: T) -> String
where
    T: std::fmt::Display,
{
    let number = number.to_string();
    if number.len() <= 4 {
        return number;
    }

    let mut formatted = String::with_capacity(number.len() + number.len() / 3);
    for (idx, c) in number.chars().enumerate() {
        if idx > 0 && (number.len() - idx) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(c);
    }

    formatted
}
