use crate::config::CameraConfig;

/// Horizontal scroll of the level, `offset_left` is the world x shown at the
/// left edge of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    offset_left: f64,
    min_offset: f64,
    max_offset: f64,
    max_speed: f64,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        Camera {
            offset_left: config.min_offset,
            min_offset: config.min_offset,
            max_offset: config.max_offset,
            max_speed: config.max_speed,
        }
    }

    pub fn offset_left(&self) -> f64 {
        self.offset_left
    }

    /// One pan step towards a view where `new_center` sits a quarter of the
    /// way into the canvas. Half the remaining distance is covered, capped at
    /// `max_speed`.
    ///
    /// Returns true once there is nothing left to do: already there, the
    /// step rounds to zero, or the offset hit a bound (and was clamped).
    pub fn pan_to(&mut self, new_center: f64, canvas_width: f64) -> bool {
        let distance = new_center - self.offset_left - canvas_width / 4.0;
        let in_bounds = self.offset_left >= self.min_offset && self.offset_left <= self.max_offset;
        if distance == 0.0 || !in_bounds {
            return true;
        }

        let mut delta_x = (distance / 2.0).round();
        if delta_x == 0.0 {
            return true;
        }
        if delta_x.abs() > self.max_speed {
            delta_x = self.max_speed * delta_x.signum();
        }
        self.offset_left += delta_x;

        if self.offset_left < self.min_offset {
            self.offset_left = self.min_offset;
            return true;
        }
        if self.offset_left > self.max_offset {
            self.offset_left = self.max_offset;
            return true;
        }
        false
    }
}
