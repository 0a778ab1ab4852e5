use anyhow::anyhow;
use crossbeam_channel::{Receiver, Sender};
use midir::{MidiInput, MidiInputConnection};
use sky_core::{decode_midi, NoteEvent};

const CLIENT_NAME: &str = "quantum-sky";

/// Open connections to every MIDI input port. Decoded note events arrive on
/// `events` and are drained by the frame loop.
pub struct MidiLink {
    _connections: Vec<MidiInputConnection<()>>,
    pub events: Receiver<NoteEvent>,
}

impl MidiLink {
    pub fn input_count(&self) -> usize {
        self._connections.len()
    }
}

fn connect_port(
    port: &midir::MidiInputPort,
    tx: Sender<NoteEvent>,
) -> anyhow::Result<MidiInputConnection<()>> {
    let input = MidiInput::new(CLIENT_NAME)?;
    let name = input.port_name(port).unwrap_or_default();
    let conn = input
        .connect(
            port,
            "quantum-sky-in",
            move |_stamp, bytes, _| {
                if let Some(event) = decode_midi(bytes) {
                    _ = tx.send(event);
                }
            },
            (),
        )
        .map_err(|e| anyhow!("{}: {}", name, e))?;
    log::info!("[midi] wired input {:?}", name);
    Ok(conn)
}

pub fn connect() -> anyhow::Result<MidiLink> {
    let scan = MidiInput::new(CLIENT_NAME)?;
    let ports = scan.ports();
    if ports.is_empty() {
        return Err(anyhow!("no MIDI inputs found"));
    }
    let (tx, rx) = crossbeam_channel::unbounded();
    let connections: Vec<_> = ports
        .iter()
        .filter_map(|port| match connect_port(port, tx.clone()) {
            Ok(conn) => Some(conn),
            Err(e) => {
                log::warn!("[midi] {}", e);
                None
            }
        })
        .collect();
    if connections.is_empty() {
        return Err(anyhow!("no MIDI input could be opened"));
    }
    Ok(MidiLink {
        _connections: connections,
        events: rx,
    })
}
