use crate::domain::model::Coordinate;
use geo::{Distance, Haversine, Point};

/// Great-circle distance in kilometres.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b)) / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_degree_along_equator() {
        let d = haversine_km(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((d - 111.195).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_symmetric_and_zero_for_same_point() {
        let marques = Coordinate::new(-9.150, 38.725);
        let belem = Coordinate::new(-9.206, 38.697);

        assert_eq!(haversine_km(marques, marques), 0.0);
        let there = haversine_km(marques, belem);
        let back = haversine_km(belem, marques);
        assert!((there - back).abs() < 1e-9);
        assert!(there > 5.0 && there < 6.0, "got {}", there);
    }
}
