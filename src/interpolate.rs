use crate::clock::ClockTime;
use crate::feed::StopTime;

/// Fills in missing times of one trip by linear interpolation between the nearest
/// stops with a known arrival. `stop_times` must already be sorted by
/// `stop_sequence`. Stops before the first or after the last known time are
/// left alone.
pub fn interpolate_stop_times(stop_times: &[StopTime]) -> Vec<StopTime> {
    let mut result = stop_times.to_vec();
    let mut anchor: Option<(usize, ClockTime)> = None;

    for (i, stop_time) in stop_times.iter().enumerate() {
        let Some(end) = stop_time.arrival_time else {
            continue;
        };
        if let Some((a, start)) = anchor {
            if i > a + 1 {
                let span = f64::from(end.seconds()) - f64::from(start.seconds());
                let step = span / (i - a) as f64;
                for (j, filled) in result.iter_mut().enumerate().take(i).skip(a + 1) {
                    let offset = (step * (j - a) as f64).round();
                    let seconds = (f64::from(start.seconds()) + offset).max(0.0) as u32;
                    let time = ClockTime::from_seconds(seconds);
                    filled.arrival_time = Some(time);
                    filled.departure_time = Some(time);
                }
            }
        }
        anchor = Some((i, end));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{StopId, TripId};

    fn stop_time(sequence: u32, time: Option<&str>) -> StopTime {
        let time = time.map(|t| ClockTime::parse(t).unwrap());
        StopTime {
            trip_id: TripId::new("T1"),
            stop_id: StopId::new(&format!("S{sequence}")),
            stop_sequence: sequence,
            arrival_time: time,
            departure_time: time,
        }
    }

    fn arrivals(stop_times: &[StopTime]) -> Vec<Option<String>> {
        stop_times
            .iter()
            .map(|st| st.arrival_time.map(|t| t.to_string()))
            .collect()
    }

    #[test]
    fn fills_evenly_spaced_gap() {
        let input = vec![
            stop_time(1, Some("08:00:00")),
            stop_time(2, None),
            stop_time(3, None),
            stop_time(4, Some("08:30:00")),
        ];
        let output = interpolate_stop_times(&input);
        assert_eq!(output[1].arrival_time.unwrap().to_string(), "08:10:00");
        assert_eq!(output[2].arrival_time.unwrap().to_string(), "08:20:00");
        assert_eq!(output[1].departure_time, output[1].arrival_time);
        // The input is untouched.
        assert_eq!(input[1].arrival_time, None);
    }

    #[test]
    fn rounds_to_nearest_second() {
        let input = vec![
            stop_time(1, Some("08:00:00")),
            stop_time(2, None),
            stop_time(3, None),
            stop_time(4, Some("08:00:10")),
        ];
        let output = interpolate_stop_times(&input);
        assert_eq!(
            arrivals(&output),
            vec![
                Some("08:00:00".to_string()),
                Some("08:00:03".to_string()),
                Some("08:00:07".to_string()),
                Some("08:00:10".to_string()),
            ]
        );
    }

    #[test]
    fn handles_service_day_overflow() {
        let input = vec![
            stop_time(5, Some("23:50:00")),
            stop_time(9, None),
            stop_time(12, Some("24:10:00")),
        ];
        let output = interpolate_stop_times(&input);
        assert_eq!(output[1].arrival_time.unwrap().to_string(), "24:00:00");
    }

    #[test]
    fn does_not_extrapolate() {
        let input = vec![
            stop_time(1, None),
            stop_time(2, Some("09:00:00")),
            stop_time(3, None),
            stop_time(4, Some("09:20:00")),
            stop_time(5, None),
        ];
        let output = interpolate_stop_times(&input);
        assert_eq!(output[0].arrival_time, None);
        assert_eq!(output[2].arrival_time.unwrap().to_string(), "09:10:00");
        assert_eq!(output[4].arrival_time, None);
    }

    #[test]
    fn keeps_endpoints_and_is_monotonic() {
        let input = vec![
            stop_time(1, Some("06:00:00")),
            stop_time(2, None),
            stop_time(3, None),
            stop_time(4, Some("06:07:00")),
            stop_time(7, None),
            stop_time(8, None),
            stop_time(9, None),
            stop_time(10, Some("06:31:00")),
        ];
        let output = interpolate_stop_times(&input);
        assert_eq!(output.len(), input.len());
        assert_eq!(output[0], input[0]);
        assert_eq!(output[3], input[3]);
        assert_eq!(output[7], input[7]);
        let times: Vec<ClockTime> = output.iter().map(|st| st.arrival_time.unwrap()).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn no_op_cases() {
        let none_known = vec![stop_time(1, None), stop_time(2, None)];
        assert_eq!(interpolate_stop_times(&none_known), none_known);

        let one_known = vec![
            stop_time(1, None),
            stop_time(2, Some("10:00:00")),
            stop_time(3, None),
        ];
        assert_eq!(interpolate_stop_times(&one_known), one_known);

        let all_known = vec![
            stop_time(1, Some("10:00:00")),
            stop_time(2, Some("10:05:00")),
            stop_time(3, Some("10:09:00")),
        ];
        assert_eq!(interpolate_stop_times(&all_known), all_known);

        assert!(interpolate_stop_times(&[]).is_empty());
    }
}
