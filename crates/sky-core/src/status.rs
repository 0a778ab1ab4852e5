use std::fmt;

/// One-line status shown to the user by either front end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Loading,
    PressStart,
    Listening { midi_inputs: usize },
    KeyboardOnly { reason: String },
    NoSounds,
}

impl Status {
    /// The status once MIDI setup has finished. A missing sound bank stays on
    /// screen since it matters more than how notes arrive.
    pub fn after_midi(&self, midi: Result<usize, String>) -> Status {
        match (self, midi) {
            (Status::NoSounds, _) => Status::NoSounds,
            (_, Ok(n)) => Status::Listening { midi_inputs: n },
            (_, Err(reason)) => Status::KeyboardOnly { reason },
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Loading => f.write_str("loading sounds…"),
            Status::PressStart => f.write_str("press start to unlock audio"),
            Status::Listening { midi_inputs: 0 } => {
                f.write_str("listening · no MIDI inputs, play the keyboard (a–;) or tap")
            }
            Status::Listening { midi_inputs: 1 } => f.write_str("listening · 1 MIDI input"),
            Status::Listening { midi_inputs } => {
                write!(f, "listening · {} MIDI inputs", midi_inputs)
            }
            Status::KeyboardOnly { reason } => {
                write!(f, "MIDI unavailable ({}) · play the keyboard (a–;) or tap", reason)
            }
            Status::NoSounds => f.write_str("sound bank missing · visuals only"),
        }
    }
}
