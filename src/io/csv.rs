use std::io::{self, Write};

use crate::body::KBody;

/// Column header of [`write_states`] rows.
pub fn write_header<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(writer, "time,name,type,pos_x,pos_y,pos_z,vel_x,vel_y,vel_z")
}

/// Write one row per body for simulated time `time` (s).
///
/// Columns: time, name, type, pos_x, pos_y, pos_z (m), vel_x, vel_y, vel_z (m/s)
pub fn write_states<'a, W, I>(writer: &mut W, time: u64, bodies: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a KBody>,
{
    for kb in bodies {
        let (p, v) = (kb.body().position(), kb.body().velocity());
        writeln!(
            writer,
            "{},{},{},{:.3},{:.3},{:.3},{:.6},{:.6},{:.6}",
            time,
            kb.name(),
            kb.body_type(),
            p.x, p.y, p.z,
            v.x, v.y, v.z,
        )?;
    }
    Ok(())
}
