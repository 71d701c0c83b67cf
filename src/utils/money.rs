use bigdecimal::BigDecimal;

/// Number of fractional digits kept on every monetary field of a view.
pub const MONEY_SCALE: i64 = 2;

/// Rounds to two decimal places, half away from zero.
///
/// `round2(25.615) == 25.62`, `round2(25.6100002) == 25.61`.
pub fn round2(value: &BigDecimal) -> BigDecimal {
    round_half_away_from_zero(value, MONEY_SCALE)
}

pub fn round_half_away_from_zero(value: &BigDecimal, scale: i64) -> BigDecimal {
    // with_scale truncates toward zero when reducing scale
    let truncated = value.with_scale(scale);
    let remainder = (value - &truncated).abs();
    let half_unit = BigDecimal::new(5.into(), scale + 1);

    if remainder < half_unit {
        return truncated;
    }

    let unit = BigDecimal::new(1.into(), scale);
    let rounded = if value < &BigDecimal::from(0) {
        truncated - unit
    } else {
        truncated + unit
    };
    rounded.with_scale(scale)
}
