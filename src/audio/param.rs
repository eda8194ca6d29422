// Time-automated parameter, evaluated against the absolute device clock.
//
// Events are kept sorted by time. A ramp event describes where the ramp
// *ends*; it starts from whatever the previous event left behind.

#[derive(Clone, Copy, Debug, PartialEq)]
enum Event {
    Set { time: f64, value: f32 },
    Linear { time: f64, value: f32 },
    Exponential { time: f64, value: f32 },
    Target { time: f64, target: f32, tau: f64 },
}

impl Event {
    fn time(&self) -> f64 {
        match *self {
            Event::Set { time, .. }
            | Event::Linear { time, .. }
            | Event::Exponential { time, .. }
            | Event::Target { time, .. } => time,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Approach {
    start: f64,
    from: f32,
    target: f32,
    tau: f64,
}

impl Approach {
    fn at(&self, t: f64) -> f32 {
        let k = (-(t - self.start) / self.tau).exp() as f32;
        self.target + (self.from - self.target) * k
    }
}

#[derive(Clone, Debug)]
pub struct Param {
    initial: f32,
    events: Vec<Event>,
}

impl Param {
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    pub fn is_automated(&self) -> bool {
        !self.events.is_empty()
    }

    fn push(&mut self, event: Event) -> &mut Self {
        // after any event at the same time, so insertion order breaks ties
        let idx = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(idx, event);
        self
    }

    pub fn set_at(&mut self, time: f64, value: f32) -> &mut Self {
        self.push(Event::Set { time, value })
    }

    pub fn linear_to(&mut self, time: f64, value: f32) -> &mut Self {
        self.push(Event::Linear { time, value })
    }

    pub fn exponential_to(&mut self, time: f64, value: f32) -> &mut Self {
        self.push(Event::Exponential { time, value })
    }

    /// Approaches `target` exponentially from `time` with time constant `tau`.
    pub fn target_at(&mut self, time: f64, target: f32, tau: f64) -> &mut Self {
        self.push(Event::Target {
            time,
            target,
            tau: tau.max(1e-6),
        })
    }

    /// Drops everything scheduled from `at` onwards and ramps from the current
    /// value to silence over `fade` seconds.
    pub fn fade_out(&mut self, at: f64, fade: f64) {
        let current = self.value_at(at);
        self.events.retain(|e| e.time() < at);
        self.set_at(at, current);
        self.linear_to(at + fade, 0.0);
    }

    pub fn value_at(&self, t: f64) -> f32 {
        let mut value = self.initial;
        let mut since = 0.0;
        let mut approach: Option<Approach> = None;

        for event in &self.events {
            let event_time = event.time();
            if event_time > t {
                let from = approach.map_or(value, |a| a.at(since));
                return match *event {
                    Event::Linear { time, value: to } => {
                        let span = time - since;
                        if span <= 0.0 {
                            from
                        } else {
                            let x = ((t - since) / span) as f32;
                            from + (to - from) * x
                        }
                    }
                    Event::Exponential { time, value: to } => {
                        let span = time - since;
                        if span <= 0.0 || from == 0.0 || to == 0.0 || (from > 0.0) != (to > 0.0) {
                            from // an exponential ramp cannot cross or touch zero
                        } else {
                            let x = (t - since) / span;
                            from * (to / from).powf(x as f32)
                        }
                    }
                    _ => approach.map_or(value, |a| a.at(t)),
                };
            }

            let reached = approach.map_or(value, |a| a.at(event_time));
            match *event {
                Event::Set { value: v, .. }
                | Event::Linear { value: v, .. }
                | Event::Exponential { value: v, .. } => {
                    value = v;
                    approach = None;
                }
                Event::Target { time, target, tau } => {
                    value = reached;
                    approach = Some(Approach {
                        start: time,
                        from: reached,
                        target,
                        tau,
                    });
                }
            }
            since = event_time;
        }

        approach.map_or(value, |a| a.at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn unautomated_param_holds_its_initial_value() {
        let p = Param::new(0.3);
        assert!(!p.is_automated());
        assert_eq!(p.value_at(0.0), 0.3);
        assert_eq!(p.value_at(100.0), 0.3);
    }

    #[test]
    fn linear_ramp_interpolates_from_previous_event() {
        let mut p = Param::new(0.0);
        p.set_at(1.0, 0.0).linear_to(2.0, 1.0);
        assert!(close(p.value_at(0.5), 0.0));
        assert!(close(p.value_at(1.5), 0.5));
        assert!(close(p.value_at(3.0), 1.0));
    }

    #[test]
    fn exponential_ramp_is_geometric() {
        let mut p = Param::new(0.0);
        p.set_at(0.0, 1.0).exponential_to(2.0, 0.01);
        assert!(close(p.value_at(1.0), 0.1));
        assert!(close(p.value_at(2.0), 0.01));
    }

    #[test]
    fn exponential_ramp_from_zero_holds_until_its_end() {
        let mut p = Param::new(0.0);
        p.set_at(0.0, 0.0).exponential_to(1.0, 0.5);
        assert_eq!(p.value_at(0.5), 0.0);
        assert_eq!(p.value_at(1.0), 0.5);
    }

    #[test]
    fn target_approaches_with_time_constant() {
        let mut p = Param::new(0.3);
        p.target_at(1.0, 0.0, 0.1);
        assert!(close(p.value_at(1.0), 0.3));
        assert!(close(p.value_at(1.1), 0.3 * (-1.0f32).exp()));
        assert!(p.value_at(3.0) < 1e-6);
    }

    #[test]
    fn chained_targets_start_from_the_reached_value() {
        let mut p = Param::new(0.3);
        p.target_at(0.0, 0.0, 0.1).target_at(2.0, 0.3, 0.1);
        assert!(p.value_at(2.0) < 1e-6);
        assert!(close(p.value_at(5.0), 0.3));
    }

    #[test]
    fn fade_out_replaces_the_future_with_a_ramp_to_zero() {
        let mut p = Param::new(0.0);
        p.set_at(0.0, 0.0).linear_to(1.0, 1.0).linear_to(4.0, 1.0).linear_to(5.0, 0.0);
        p.fade_out(2.0, 0.1);
        assert!(close(p.value_at(2.0), 1.0));
        assert!(close(p.value_at(2.05), 0.5));
        assert_eq!(p.value_at(2.1), 0.0);
        assert_eq!(p.value_at(4.5), 0.0);
    }
}
