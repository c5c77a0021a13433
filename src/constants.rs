//
// IMAGES
//
pub const SKY_WIDTH: usize = 1080;
// Map pixels per degree of polar distance
pub const MAP_SCALE: f64 = 6.0;
pub const SKYBOX_STAR: u8 = 255;

//
// BRIGHTNESS
//
pub const BRIGHT_CUT: f64 = 0.9;
pub const BRIGHT_VALUE: f64 = 1.0;
// Everything below the floor is raised to it, not just values under 0.5,
// so a brighter star never renders dimmer than a fainter one
pub const FAINT_FLOOR: f64 = 0.6;
// Used when the magnitude range of an observer collapses
pub const NEUTRAL_BRIGHTNESS: f64 = 0.8;

//
// CUBE FACES
//
pub const FACE_SPAN: f64 = 90.0;
pub const SIDE_DEC_LO: f64 = -45.0;
pub const SIDE_DEC_HI: f64 = 45.0;
pub const POLE_DEC: f64 = 90.0;

//
// FILES
//
pub const SKYBOX_JSON: &str = "skyboxes.json";
pub const SKYMAP_JSON: &str = "skymaps.json";
pub const PLANET_INDEX_JSON: &str = "planets.json";
