//! External schedule feeds: volume targets and no-change windows for
//! continuous elements, and the max-power limits of power stations.

use crate::error::{check_len, AroError};
use crate::index::DecisionIndex;
use crate::matrix::{self, FlowDirection};
use crate::network::Network;
use crate::robust::{AffineRhs, ConstraintSense, RobustConstraint};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::Path;

const DATETIME_FORMATS: [&str; 4] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%d-%m-%Y"];

/// Parses a day-first timestamp, with or without the time of day
pub fn parse_dayfirst(text: &str) -> Result<NaiveDateTime, AroError> {
    let text = text.trim();
    for format in DATETIME_FORMATS.iter() {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(datetime);
        }
    }
    for format in DATE_FORMATS.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            if let Some(datetime) = date.and_hms_opt(0, 0, 0) {
                return Ok(datetime);
            }
        }
    }
    Err(AroError::InvalidDate(text.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TargetOperator {
    Le,
    Ge,
    Eq,
}

impl From<TargetOperator> for ConstraintSense {
    fn from(operator: TargetOperator) -> Self {
        match operator {
            TargetOperator::Le => ConstraintSense::Le,
            TargetOperator::Ge => ConstraintSense::Ge,
            TargetOperator::Eq => ConstraintSense::Eq,
        }
    }
}

#[derive(Deserialize)]
struct VolumeTargetRecord {
    start: String,
    end: String,
    vsp: String,
    vol: f64,
    constraint_type: TargetOperator,
}

#[derive(Deserialize)]
struct NoChangeRecord {
    start: String,
    end: String,
    vsp: String,
}

/// Total flow of an element over `[start, end]` compared to `vol`
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeTarget {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub vsp: String,
    pub vol: f64,
    pub sense: ConstraintSense,
}

/// The element keeps its decision constant strictly inside `(start, end)`
#[derive(Debug, Clone, PartialEq)]
pub struct NoChangeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub vsp: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaxPowerLimit {
    pub name: String,
    pub max_power_on: f64,
    pub max_power_off: f64,
}

/// Records of every schedule feed. A missing feed has no records.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub volume_targets: Vec<VolumeTarget>,
    pub no_change_windows: Vec<NoChangeWindow>,
    pub max_power_limits: Vec<MaxPowerLimit>,
}

fn read_records<T: for<'de> Deserialize<'de>>(
    filepath: &Path,
) -> Result<Vec<T>, AroError> {
    if !filepath.exists() {
        return Ok(vec![]);
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(filepath)?;
    let mut records = vec![];
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

pub fn read_volume_targets(filepath: &Path) -> Result<Vec<VolumeTarget>, AroError> {
    read_records::<VolumeTargetRecord>(filepath)?
        .into_iter()
        .map(|r| -> Result<VolumeTarget, AroError> {
            Ok(VolumeTarget {
                start: parse_dayfirst(&r.start)?,
                end: parse_dayfirst(&r.end)?,
                vsp: r.vsp,
                vol: r.vol,
                sense: r.constraint_type.into(),
            })
        })
        .collect()
}

pub fn read_no_change_windows(
    filepath: &Path,
) -> Result<Vec<NoChangeWindow>, AroError> {
    read_records::<NoChangeRecord>(filepath)?
        .into_iter()
        .map(|r| -> Result<NoChangeWindow, AroError> {
            Ok(NoChangeWindow {
                start: parse_dayfirst(&r.start)?,
                end: parse_dayfirst(&r.end)?,
                vsp: r.vsp,
            })
        })
        .collect()
}

pub fn read_max_power_limits(
    filepath: &Path,
) -> Result<Vec<MaxPowerLimit>, AroError> {
    read_records(filepath)
}

impl Schedule {
    /// Reads `vsp_volume.csv`, `vsp_changes.csv` and `power_stations.csv`
    /// from the input directory
    pub fn read(path: &str) -> Result<Self, AroError> {
        let dir = Path::new(path);
        Ok(Self {
            volume_targets: read_volume_targets(&dir.join("vsp_volume.csv"))?,
            no_change_windows: read_no_change_windows(
                &dir.join("vsp_changes.csv"),
            )?,
            max_power_limits: read_max_power_limits(
                &dir.join("power_stations.csv"),
            )?,
        })
    }
}

/// 1.0 for the steps inside the window, 0.0 elsewhere
pub fn window_mask(
    time_range: &[NaiveDateTime],
    start: NaiveDateTime,
    end: NaiveDateTime,
    inclusive: bool,
) -> Vec<f64> {
    time_range
        .iter()
        .map(|t| {
            let inside = if inclusive {
                *t >= start && *t <= end
            } else {
                *t > start && *t < end
            };
            if inside {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Range of a continuous element, which has one position per step
fn continuous_range(
    network: &Network,
    index: &DecisionIndex,
    name: &str,
) -> Result<(usize, usize), AroError> {
    network.flow_element(name)?;
    let (xmin_idx, xmax_idx) = index.get_x_idx(name)?;
    check_len(name, index.num_steps(), xmax_idx - xmin_idx)?;
    Ok((xmin_idx, xmax_idx))
}

pub fn vsp_volume(
    network: &Network,
    index: &DecisionIndex,
    targets: &[VolumeTarget],
) -> Result<Vec<RobustConstraint>, AroError> {
    let num_steps = index.num_steps();
    let mut constraints = Vec::with_capacity(targets.len());
    for target in targets.iter() {
        let (xmin_idx, _) = continuous_range(network, index, &target.vsp)?;
        let mask =
            window_mask(&network.time_range, target.start, target.end, true);
        let flow = matrix::not_comb_matrix(num_steps, FlowDirection::In);
        let terms = matrix::masked_column_sums(&flow, &mask)
            .into_iter()
            .enumerate()
            .filter(|(_, v)| *v != 0.0)
            .map(|(t, v)| (xmin_idx + t, v))
            .collect();
        constraints.push(RobustConstraint::new(
            terms,
            target.sense,
            AffineRhs::constant(target.vol),
        ));
    }
    Ok(constraints)
}

pub fn vsp_changes(
    network: &Network,
    index: &DecisionIndex,
    windows: &[NoChangeWindow],
) -> Result<Vec<RobustConstraint>, AroError> {
    let num_steps = index.num_steps();
    let mut constraints = vec![];
    for window in windows.iter() {
        let (xmin_idx, _) = continuous_range(network, index, &window.vsp)?;
        let mask =
            window_mask(&network.time_range, window.start, window.end, false);
        let difference = matrix::first_difference_matrix(num_steps, &mask);
        for terms in matrix::row_terms(&difference, xmin_idx) {
            constraints.push(RobustConstraint::new(
                terms,
                ConstraintSense::Eq,
                AffineRhs::constant(0.0),
            ));
        }
    }
    Ok(constraints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::fixtures::*;

    #[test]
    fn test_parse_dayfirst() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 3)
            .unwrap()
            .and_hms_opt(4, 30, 0)
            .unwrap();
        assert_eq!(parse_dayfirst("03/02/2024 04:30").unwrap(), expected);
        assert_eq!(parse_dayfirst(" 03-02-2024 04:30:00 ").unwrap(), expected);
        assert_eq!(
            parse_dayfirst("03/02/2024").unwrap(),
            expected.date().and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_dayfirst_rejects_garbage() {
        assert!(matches!(
            parse_dayfirst("2024-13-45"),
            Err(AroError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_window_masks() {
        let range = time_range(4);
        let mask_in = window_mask(&range, range[1], range[2], true);
        assert_eq!(mask_in, vec![0.0, 1.0, 1.0, 0.0]);
        let mask_open = window_mask(&range, range[0], range[3], false);
        assert_eq!(mask_open, vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_vsp_volume_sums_window() {
        let network = single_tank_network();
        let index = DecisionIndex::new(&network);
        let targets = vec![VolumeTarget {
            start: network.time_range[1],
            end: network.time_range[2],
            vsp: "VSP1".to_string(),
            vol: 1.5,
            sense: ConstraintSense::Ge,
        }];
        let constraints = vsp_volume(&network, &index, &targets).unwrap();
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].terms, vec![(1, 1.0), (2, 1.0)]);
        assert_eq!(constraints[0].sense, ConstraintSense::Ge);
    }

    #[test]
    fn test_vsp_volume_outside_horizon_is_empty() {
        let network = single_tank_network();
        let index = DecisionIndex::new(&network);
        let late = network.time_range[2] + chrono::Duration::days(1);
        let targets = vec![VolumeTarget {
            start: late,
            end: late,
            vsp: "VSP1".to_string(),
            vol: 0.0,
            sense: ConstraintSense::Le,
        }];
        let constraints = vsp_volume(&network, &index, &targets).unwrap();
        assert!(constraints[0].terms.is_empty());
    }

    #[test]
    fn test_vsp_changes_open_window() {
        let network = single_tank_network();
        let index = DecisionIndex::new(&network);
        let windows = vec![NoChangeWindow {
            start: network.time_range[0],
            end: network.time_range[2] + chrono::Duration::minutes(1),
            vsp: "VSP1".to_string(),
        }];
        let constraints = vsp_changes(&network, &index, &windows).unwrap();
        assert_eq!(constraints.len(), 3);
        assert!(constraints[0].terms.is_empty());
        // step 1 is strictly inside, step 2 too
        assert_eq!(constraints[1].terms, vec![(0, -1.0), (1, 1.0)]);
        assert_eq!(constraints[2].terms, vec![(1, -1.0), (2, 1.0)]);
    }

    #[test]
    fn test_schedule_rejects_comb_element() {
        let network = pump_station_network();
        let index = DecisionIndex::new(&network);
        let windows = vec![NoChangeWindow {
            start: network.time_range[0],
            end: network.time_range[1],
            vsp: "PS1".to_string(),
        }];
        assert!(matches!(
            vsp_changes(&network, &index, &windows),
            Err(AroError::Shape { .. })
        ));
    }

    #[test]
    fn test_read_schedule_example() {
        let schedule = Schedule::read("example").unwrap();
        assert_eq!(schedule.volume_targets.len(), 1);
        assert_eq!(schedule.volume_targets[0].sense, ConstraintSense::Ge);
        assert_eq!(schedule.no_change_windows.len(), 1);
        assert_eq!(schedule.max_power_limits.len(), 1);
        assert_eq!(schedule.max_power_limits[0].name, "E1");
    }

    #[test]
    fn test_missing_feeds_have_no_records() {
        let schedule = Schedule::read("does-not-exist").unwrap();
        assert!(schedule.volume_targets.is_empty());
        assert!(schedule.no_change_windows.is_empty());
        assert!(schedule.max_power_limits.is_empty());
    }
}
