//! Output surfaces the player writes to.
//!
//! The player never reads back from a sink. Closures implement both traits,
//! so a host can pass `|msg: &str| label.set_text(msg)` directly.

/// Enabled state of the previous/next controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Navigation {
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

/// Receives the narrative message each time a step begins.
pub trait NarrativeSink {
    fn show(&mut self, message: &str);
}

/// Receives navigation affordances after every step and once at startup.
pub trait NavigationSink {
    fn set_navigation(&mut self, navigation: Navigation);
}

impl<F: FnMut(&str)> NarrativeSink for F {
    fn show(&mut self, message: &str) {
        self(message)
    }
}

impl<F: FnMut(Navigation)> NavigationSink for F {
    fn set_navigation(&mut self, navigation: Navigation) {
        self(navigation)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NarrativeSink for NullSink {
    fn show(&mut self, _message: &str) {}
}

impl NavigationSink for NullSink {
    fn set_navigation(&mut self, _navigation: Navigation) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_sinks() {
        let mut shown = Vec::new();
        {
            let mut sink = |m: &str| shown.push(m.to_string());
            sink.show("hello");
        }
        assert_eq!(shown, vec!["hello".to_string()]);

        let mut last = None;
        {
            let mut sink = |n: Navigation| last = Some(n);
            sink.set_navigation(Navigation {
                previous_enabled: false,
                next_enabled: true,
            });
        }
        assert_eq!(
            last,
            Some(Navigation {
                previous_enabled: false,
                next_enabled: true
            })
        );
    }

    #[test]
    fn null_sink_accepts_everything() {
        let mut sink = NullSink;
        sink.show("ignored");
        sink.set_navigation(Navigation::default());
    }
}
