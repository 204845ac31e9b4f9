const KAABA_LAT: f64 = 21.4225;
const KAABA_LNG: f64 = 39.8262;

/// Initial great-circle bearing from the given location to the Kaaba, in
/// degrees clockwise from true north, within `[0, 360)`.
pub fn qibla_bearing(latitude: f64, longitude: f64) -> f64 {
    let phi = latitude.to_radians();
    let phi_k = KAABA_LAT.to_radians();
    let delta = (KAABA_LNG - longitude).to_radians();

    let y = delta.sin();
    let x = phi.cos() * phi_k.tan() - phi.sin() * delta.cos();
    y.atan2(x).to_degrees().rem_euclid(360.0)
}

pub fn compass_point(bearing: f64) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let idx = ((bearing.rem_euclid(360.0) + 22.5) / 45.0) as usize % 8;
    POINTS[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_cities() {
        // Islamabad faces roughly west-south-west.
        let isb = qibla_bearing(33.6938, 73.0651);
        assert!((isb - 255.0).abs() < 2.0, "{isb}");
        // London faces roughly south-east.
        let lon = qibla_bearing(51.5074, -0.1278);
        assert!((lon - 119.0).abs() < 2.0, "{lon}");
    }

    #[test]
    fn bearing_is_normalised() {
        for (lat, lng) in [(0.0, 0.0), (-33.9, 151.2), (40.7, -74.0), (64.1, -21.9)] {
            let b = qibla_bearing(lat, lng);
            assert!((0.0..360.0).contains(&b));
        }
    }

    #[test]
    fn compass_points() {
        assert_eq!(compass_point(0.0), "N");
        assert_eq!(compass_point(359.0), "N");
        assert_eq!(compass_point(119.0), "SE");
        assert_eq!(compass_point(255.0), "W");
    }
}
