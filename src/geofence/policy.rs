use serde::{Deserialize, Serialize};

/// How much the GPS step insists on a location.
///
/// Two separate questions hang off the mode: whether coordinates must be
/// acquired at all, and whether they must fall inside the geofence before the
/// worker can continue. Only `RequiredAtLocation` answers yes to the second.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GpsMode {
    RequiredAtLocation,
    RequiredButNotStrict,
    VisibleOptional,
    NotRequired,
}

impl GpsMode {
    pub fn requires_coordinates(&self) -> bool {
        match self {
            GpsMode::RequiredAtLocation
            | GpsMode::RequiredButNotStrict
            | GpsMode::VisibleOptional => true,
            GpsMode::NotRequired => false,
        }
    }

    pub fn is_strict(&self) -> bool {
        match self {
            GpsMode::RequiredAtLocation => true,
            GpsMode::RequiredButNotStrict | GpsMode::VisibleOptional | GpsMode::NotRequired => {
                false
            }
        }
    }
}

pub fn is_gps_coordinate_required(mode: GpsMode) -> bool {
    mode.requires_coordinates()
}

pub fn is_strict(mode: GpsMode) -> bool {
    mode.is_strict()
}

pub fn can_advance_from_gps_step(mode: GpsMode, has_fix: bool, is_within: bool) -> bool {
    if !is_gps_coordinate_required(mode) {
        return true;
    }
    if !has_fix {
        return false;
    }
    if is_strict(mode) {
        return is_within;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_MODES: [GpsMode; 4] = [
        GpsMode::RequiredAtLocation,
        GpsMode::RequiredButNotStrict,
        GpsMode::VisibleOptional,
        GpsMode::NotRequired,
    ];

    #[test]
    fn only_required_at_location_is_strict() {
        let strict: Vec<_> = ALL_MODES.iter().filter(|m| is_strict(**m)).collect();
        assert_eq!(strict, vec![&GpsMode::RequiredAtLocation]);
    }

    #[test]
    fn only_not_required_skips_coordinates() {
        for mode in ALL_MODES {
            assert_eq!(is_gps_coordinate_required(mode), mode != GpsMode::NotRequired);
        }
    }

    #[test]
    fn not_required_always_advances() {
        assert!(can_advance_from_gps_step(GpsMode::NotRequired, false, false));
        assert!(can_advance_from_gps_step(GpsMode::NotRequired, true, false));
    }

    #[test]
    fn required_modes_need_a_fix() {
        for mode in [
            GpsMode::RequiredAtLocation,
            GpsMode::RequiredButNotStrict,
            GpsMode::VisibleOptional,
        ] {
            assert!(!can_advance_from_gps_step(mode, false, true), "{mode:?}");
        }
    }

    #[test]
    fn strict_mode_needs_to_be_inside() {
        assert!(!can_advance_from_gps_step(GpsMode::RequiredAtLocation, true, false));
        assert!(can_advance_from_gps_step(GpsMode::RequiredAtLocation, true, true));
    }

    #[test]
    fn non_strict_mode_accepts_any_fix() {
        assert!(can_advance_from_gps_step(GpsMode::RequiredButNotStrict, true, false));
        assert!(can_advance_from_gps_step(GpsMode::VisibleOptional, true, false));
    }

    #[test]
    fn mode_uses_screaming_snake_case_on_the_wire() {
        let json = serde_json::to_string(&GpsMode::RequiredButNotStrict).unwrap();
        assert_eq!(json, r#""REQUIRED_BUT_NOT_STRICT""#);
    }
}
