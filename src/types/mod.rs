pub mod geo_point;
pub mod observation;
pub mod station;
pub mod yearly_rainfall;
