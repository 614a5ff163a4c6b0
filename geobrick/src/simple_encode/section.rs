use crate::{
    pdf::{
        trailer::{Trailer, TRAILER},
        Dictionary, XrefEntry, XrefTable,
    },
    simple_encode::SimpleEncoder,
    writer::{Encoder, Writer},
};

const FREE_HEAD: &[u8] = b"0000000000 65535 f \n";

/// Classic xref section.
///
/// A full section lists every allocated object in one subsection starting at
/// object 0. An incremental section only lists objects written since the file
/// was opened, one subsection per run of consecutive object numbers.
pub(crate) struct XrefSection<'a> {
    pub table: &'a XrefTable,
    pub incremental: bool,
}

fn write_entry(entry: &XrefEntry, writer: &mut dyn Writer) {
    let kind = if entry.free { 'f' } else { 'n' };
    writer.write(format!("{:010} {:05} {} \n", entry.offset, entry.generation, kind).as_bytes());
}

impl Encoder<XrefSection<'_>> for SimpleEncoder {
    fn write_to(section: &XrefSection<'_>, writer: &mut dyn Writer) {
        log::trace!("write xref, incremental: {}", section.incremental);
        writer.write(b"xref\n");
        if section.incremental {
            writer.write(b"0 1\n");
            writer.write(FREE_HEAD);
            for (first, run) in section.table.written_runs() {
                writer.write(format!("{} {}\n", first, run.len()).as_bytes());
                for entry in run {
                    write_entry(entry, writer);
                }
            }
        } else {
            writer.write(format!("0 {}\n", section.table.len() + 1).as_bytes());
            writer.write(FREE_HEAD);
            for entry in section.table.entries() {
                write_entry(entry, writer);
            }
        }
    }
}

impl Encoder<Trailer> for SimpleEncoder {
    fn write_to(trailer: &Trailer, writer: &mut dyn Writer) {
        log::trace!("write Trailer");

        let trailer_dict: Dictionary = trailer.clone().into();
        writer.write(TRAILER);
        writer.write(b"\n");
        Self::write_to(&trailer_dict, writer);
        writer.write(b"\n");
    }
}

/// `startxref` pointer and end of file marker that close every section.
pub(crate) fn write_startxref(offset: u64, writer: &mut dyn Writer) {
    writer.write(format!("startxref\n{}\n%%EOF\n", offset).as_bytes());
}
