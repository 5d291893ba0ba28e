use circle_raster::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecorderState {
    Idle,
    Recording,
}

/// Accumulates the ordered samples of the attempt currently being drawn.
///
/// `begin` resets the sequence, `end` freezes it without clearing so the
/// scoring pipeline can read the finished stroke; the points are only
/// discarded when the next attempt begins or the session restarts.
#[derive(Debug)]
pub struct StrokeRecorder {
    state: RecorderState,
    points: Vec<Point>,
}

impl Default for StrokeRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl StrokeRecorder {
    pub fn new() -> Self {
        StrokeRecorder {
            state: RecorderState::Idle,
            points: Vec::new(),
        }
    }

    pub fn begin(&mut self) {
        self.points.clear();
        self.state = RecorderState::Recording;
    }

    /// Append a sample. Samples arriving while idle (pointer drift between
    /// attempts) are dropped.
    pub fn sample(&mut self, point: Point) {
        if self.state == RecorderState::Recording {
            self.points.push(point);
        }
    }

    pub fn end(&mut self) {
        self.state = RecorderState::Idle;
    }

    pub fn reset(&mut self) {
        self.points.clear();
        self.state = RecorderState::Idle;
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_outside_recording_are_dropped() {
        let mut recorder = StrokeRecorder::new();
        recorder.sample(Point::new(1.0, 1.0));
        assert!(recorder.points().is_empty());

        recorder.begin();
        recorder.sample(Point::new(2.0, 2.0));
        recorder.end();
        recorder.sample(Point::new(3.0, 3.0));
        assert_eq!(recorder.points().len(), 1);
    }

    #[test]
    fn end_freezes_without_clearing() {
        let mut recorder = StrokeRecorder::new();
        recorder.begin();
        recorder.sample(Point::new(1.0, 2.0));
        recorder.sample(Point::new(3.0, 4.0));
        recorder.end();
        assert!(!recorder.is_recording());
        assert_eq!(recorder.points().len(), 2);
    }

    #[test]
    fn begin_discards_the_previous_stroke() {
        let mut recorder = StrokeRecorder::new();
        recorder.begin();
        recorder.sample(Point::new(1.0, 1.0));
        recorder.end();

        recorder.begin();
        assert!(recorder.points().is_empty());
        assert!(recorder.is_recording());
    }
}
