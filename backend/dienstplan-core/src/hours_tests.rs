// src/hours_tests.rs

#[cfg(test)]
mod tests {
    use crate::entries::*;
    use crate::hours::*;
    use crate::model::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    // Helper function to create a planned working day
    fn planned(start: &str, end: &str, hours: Decimal) -> DayEntry {
        DayEntry {
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            planned_hours: hours,
            ..DayEntry::empty("Mo", "08.12.")
        }
    }

    fn employee(name: &str, is_minor: bool, role: Role, prep: bool) -> Employee {
        Employee {
            name: name.to_string(),
            area: Area::Nest,
            is_minor,
            role,
            standard_hours: dec!(6),
            can_track_prep_time: prep,
        }
    }

    fn week(name: &str, days: Vec<DayEntry>) -> WeekSheet {
        let mut map = BTreeMap::new();
        map.insert(name.to_string(), days);
        WeekSheet {
            label: "KW 50".to_string(),
            date_range: "08.12. - 12.12.2025".to_string(),
            days: map,
        }
    }

    #[test]
    fn adult_seven_hour_shift_loses_break() {
        let day = planned("08:30", "15:30", dec!(7));
        let hours = day_hours(&day, None, false);
        assert_eq!(hours.worked, dec!(7));
        assert_eq!(hours.break_deduction, dec!(0.5));
        assert_eq!(hours.actual, dec!(6.5));
        assert!(hours.counted);
    }

    #[test]
    fn minor_uses_lower_threshold() {
        let day = planned("08:20", "14:10", dec!(5.83));
        let hours = day_hours(&day, None, true);
        assert_eq!(hours.break_deduction, dec!(0.5));
        assert_eq!(hours.actual, dec!(5.33));

        // Same shift for an adult stays below six hours.
        let adult = day_hours(&day, None, false);
        assert_eq!(adult.break_deduction, Decimal::ZERO);
        assert_eq!(adult.actual, dec!(5.83));
    }

    #[test]
    fn positive_deviation_can_trigger_break() {
        let day = planned("08:00", "14:00", dec!(6));
        let none = day_hours(&day, None, false);
        assert_eq!(none.actual, dec!(6));

        let plus_one = DeviationValue::Hours(dec!(1));
        let hours = day_hours(&day, Some(&plus_one), false);
        assert_eq!(hours.worked, dec!(7));
        assert_eq!(hours.actual, dec!(6.5));
    }

    #[test]
    fn stored_text_deviations_feed_the_day() {
        let day = planned("08:00", "14:00", dec!(6));

        let plus_one = DeviationValue::parse("+1");
        let hours = day_hours(&day, Some(&plus_one), false);
        assert_eq!(hours.worked, dec!(7));
        assert_eq!(hours.actual, dec!(6.5));

        let comma = DeviationValue::parse("1,5");
        assert_eq!(day_hours(&day, Some(&comma), false).actual, dec!(7));

        let garbage = DeviationValue::parse("viel");
        assert_eq!(day_hours(&day, Some(&garbage), false).actual, dec!(6));
    }

    #[test]
    fn threshold_is_strict() {
        let day = planned("08:00", "14:00", dec!(6));
        assert_eq!(day_hours(&day, None, false).break_deduction, Decimal::ZERO);

        let minor_day = planned("08:00", "12:30", dec!(4.5));
        assert_eq!(day_hours(&minor_day, None, true).break_deduction, Decimal::ZERO);
        let quarter = DeviationValue::Hours(dec!(0.25));
        assert_eq!(
            day_hours(&minor_day, Some(&quarter), true).break_deduction,
            dec!(0.5)
        );
    }

    #[test]
    fn schedule_absence_keeps_planned_hours() {
        let day = DayEntry::absent("Mo", "08.12.", AbsenceCode::Sick, dec!(5.5));
        let hours = day_hours(&day, None, false);
        assert_eq!(hours.actual, dec!(5.5));
        assert_eq!(hours.break_deduction, Decimal::ZERO);
        assert_eq!(hours.absence, Some(AbsenceCode::Sick));
    }

    #[test]
    fn absence_ignores_numeric_deviation() {
        let day = DayEntry::absent("Mo", "08.12.", AbsenceCode::Vacation, dec!(8));
        let deviation = DeviationValue::Hours(dec!(-2));
        let hours = day_hours(&day, Some(&deviation), false);
        assert_eq!(hours.actual, dec!(8));
        assert_eq!(hours.break_deduction, Decimal::ZERO);
    }

    #[test]
    fn absence_deviation_overrides_plan() {
        let day = planned("08:30", "15:30", dec!(7));
        let deviation = DeviationValue::Absence(AbsenceCode::ChildSick);
        let hours = day_hours(&day, Some(&deviation), false);
        assert_eq!(hours.actual, dec!(7));
        assert_eq!(hours.break_deduction, Decimal::ZERO);
        assert_eq!(hours.absence, Some(AbsenceCode::ChildSick));
    }

    #[test]
    fn zero_planned_day_contributes_nothing() {
        let day = DayEntry::empty("Do", "11.12.");
        let deviation = DeviationValue::Hours(dec!(2));
        let hours = day_hours(&day, Some(&deviation), false);
        assert!(!hours.counted);
        assert_eq!(hours.actual, Decimal::ZERO);
    }

    #[test]
    fn break_rule_holds_for_all_quarter_hour_deviations() {
        let plans = [dec!(0.5), dec!(3), dec!(4.5), dec!(5.75), dec!(6), dec!(7.67), dec!(9)];
        for is_minor in [false, true] {
            for p in plans {
                let day = planned("08:00", "16:00", p);
                for step in -12..=12 {
                    let d = Decimal::new(step * 25, 2);
                    let hours = day_hours(&day, Some(&DeviationValue::Hours(d)), is_minor);
                    let expected_break = if p + d > break_threshold(is_minor) {
                        dec!(0.5)
                    } else {
                        Decimal::ZERO
                    };
                    assert_eq!(hours.worked, p + d, "p={} d={}", p, d);
                    assert_eq!(hours.break_deduction, expected_break, "p={} d={}", p, d);
                    assert_eq!(hours.actual, p + d - expected_break);
                }
            }
        }
    }

    #[test]
    fn week_totals_sum_counted_days_only() {
        let berit = employee("Berit", false, Role::Staff, true);
        let days = vec![
            planned("08:30", "15:30", dec!(7)),
            planned("09:00", "12:00", dec!(3)),
            DayEntry::absent("Mi", "10.12.", AbsenceCode::Sick, dec!(6.5)),
            DayEntry::empty("Do", "11.12."),
            planned("08:30", "14:30", dec!(6)),
        ];
        let sheet = week("Berit", days);
        let mut deviations = DeviationMap::new();
        deviations.insert(DeviationKey::new("Berit", 0, 1), DeviationValue::Hours(dec!(-0.5)));
        deviations.insert(DeviationKey::new("Berit", 0, 3), DeviationValue::Hours(dec!(3)));
        deviations.insert(DeviationKey::new("Alina", 0, 0), DeviationValue::Hours(dec!(3)));

        let result = week_totals(&sheet, 0, &berit, &deviations);
        assert_eq!(result.days.len(), 5);
        assert_eq!(result.totals.planned, dec!(22.5));
        // 6.5 + 2.5 + 6.5 + 0 + 6
        assert_eq!(result.totals.actual, dec!(21.5));
        assert_eq!(result.totals.breaks, dec!(0.5));
        assert_eq!(result.totals.difference(), dec!(-1));
    }

    #[test]
    fn month_folds_in_eligible_extra_time() {
        let day = NaiveDate::from_ymd_opt(2025, 12, 10).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 12, 10, 12, 0, 0).unwrap();
        let mut extra = ExtraTime::default();
        extra.adjust(ExtraTimeKind::Preparation, day, dec!(1.5), now);
        extra.adjust(ExtraTimeKind::Office, day, dec!(2), now);

        let weeks = vec![
            week("Catharina", vec![planned("08:30", "16:00", dec!(7.5))]),
            week("Catharina", vec![planned("09:00", "15:00", dec!(6))]),
        ];

        let lead = employee("Catharina", false, Role::Lead, true);
        let report = month_totals(&weeks, &lead, &DeviationMap::new(), Some(&extra));
        assert_eq!(report.weeks.len(), 2);
        assert_eq!(report.totals.actual, dec!(13));
        assert_eq!(report.preparation, dec!(1.5));
        assert_eq!(report.office, dec!(2));
        assert_eq!(report.grand_total(), dec!(16.5));

        let staff = employee("Catharina", false, Role::Staff, true);
        let report = month_totals(&weeks, &staff, &DeviationMap::new(), Some(&extra));
        assert_eq!(report.office, Decimal::ZERO);
        assert_eq!(report.grand_total(), dec!(14.5));

        let no_prep = employee("Catharina", false, Role::Lead, false);
        let report = month_totals(&weeks, &no_prep, &DeviationMap::new(), Some(&extra));
        assert_eq!(report.extra_total(), Decimal::ZERO);
    }

    #[test]
    fn hours_format_with_comma() {
        assert_eq!(format_hours(dec!(7.50)), "7,5 h");
        assert_eq!(format_hours(dec!(5.3333)), "5,33 h");
        assert_eq!(format_hours(dec!(6)), "6 h");
    }

    #[test]
    fn employee_report_uses_book_entries_and_status() {
        let schedule = crate::demo::demo_schedule();
        let period = MonthPeriod::new(2025, 12).unwrap();
        let berit = schedule.employee("Berit").unwrap().clone();
        let now = Utc.with_ymd_and_hms(2025, 12, 20, 9, 0, 0).unwrap();

        let mut book = EntryBook::default();
        let mut entries = DeviationMap::new();
        // KW 50 Tuesday 09:00-12:00 plus one hour
        entries.insert(DeviationKey::new("Berit", 0, 1), DeviationValue::Hours(dec!(1)));
        // KW 51 Monday sick
        entries.insert(DeviationKey::new("Berit", 1, 0), DeviationValue::Absence(AbsenceCode::Sick));
        book.submit("Berit", period, &entries, None, now).unwrap();

        let report = employee_month_report(&schedule, &berit, &book, period);
        assert_eq!(report.status, MonthStatus::Submitted);
        // Soll: 7 + 3 + 6.5 + 6 and 7 + 6.5 + 6
        assert_eq!(report.hours.totals.planned, dec!(42));
        // Ist: 6.5 + 4 + 6 + 6 and 7 + 6 + 6
        assert_eq!(report.hours.totals.actual, dec!(41.5));
        assert_eq!(report.hours.totals.breaks, dec!(1.5));
    }
}
