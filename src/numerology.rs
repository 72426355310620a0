use chrono::{Datelike, NaiveDate};

/// Life Path Number: add every digit of month, day and year, then keep
/// summing the digits of the result until one digit is left.
pub fn life_path_number(birthdate: NaiveDate) -> u32 {
    let total = digit_sum(birthdate.month())
        + digit_sum(birthdate.day())
        + digit_sum(birthdate.year().unsigned_abs());
    reduce(total)
}

fn digit_sum(mut n: u32) -> u32 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

fn reduce(mut n: u32) -> u32 {
    while n > 9 {
        n = digit_sum(n);
    }
    n
}
