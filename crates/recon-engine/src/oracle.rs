//! Oracle builder (§4.4): projects the reordered stream down to a bare
//! alloc/free trace, fed to both a human-readable text sink and a CSV
//! sink meant for downstream tooling.

use std::collections::HashMap;
use std::io::Write;

use recon_model::{ObjectId, SiteId, ThreadId, TypeId};

use crate::error::ReconError;
use crate::reorder::StreamItem;

const CSV_HEADER: &str = "timestamp,event_type,object_id,size,site_id,thread_id,type_id";

#[derive(Debug, Clone, Copy)]
struct LiveAllocation {
    size: u64,
    site: SiteId,
    thread: ThreadId,
    type_id: TypeId,
}

#[derive(Debug, Default, Clone)]
pub struct OracleStats {
    pub allocs: u64,
    pub frees: u64,
    pub pre_existing_frees_included: u64,
    pub pre_existing_frees_omitted: u64,
}

pub struct OracleOutput {
    pub text: String,
    pub csv: String,
    pub stats: OracleStats,
}

/// Build both oracle sinks from a reordered stream (§4.4). Every free
/// has a matching earlier alloc in the text/csv sinks unless it is a
/// free of a pre-existing object and `include_pre_existing_frees` is
/// set, in which case it is emitted with a zeroed size/site/type.
pub fn build(stream: &[StreamItem], include_pre_existing_frees: bool) -> Result<OracleOutput, ReconError> {
    let mut live: HashMap<ObjectId, LiveAllocation> = HashMap::new();
    let mut text = String::new();
    let mut csv = String::new();
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    let mut stats = OracleStats::default();

    for item in stream {
        match item {
            StreamItem::Event(event) => {
                if let recon_model::Record::Alloc(a) = event.record {
                    live.insert(
                        a.object,
                        LiveAllocation {
                            size: a.size,
                            site: a.site,
                            thread: a.thread,
                            type_id: a.type_id,
                        },
                    );
                    stats.allocs += 1;
                    write_alloc_line(&mut text, event.clock, a.object, a.size, a.site, a.thread);
                    write_alloc_row(&mut csv, event.clock, a.object, a.size, a.site, a.thread, a.type_id);
                }
            }
            StreamItem::Death(death) => {
                if let Some(alloc) = live.remove(&death.object) {
                    stats.frees += 1;
                    write_free_line(&mut text, death.clock, death.object, alloc.size, alloc.site, alloc.thread);
                    write_free_row(
                        &mut csv,
                        death.clock,
                        death.object,
                        alloc.size,
                        alloc.site,
                        alloc.thread,
                        alloc.type_id,
                    );
                } else if include_pre_existing_frees {
                    stats.pre_existing_frees_included += 1;
                    stats.frees += 1;
                    write_free_line(&mut text, death.clock, death.object, 0, SiteId::NULL, death.thread);
                    write_free_row(&mut csv, death.clock, death.object, 0, SiteId::NULL, death.thread, TypeId::NULL);
                } else {
                    stats.pre_existing_frees_omitted += 1;
                }
            }
        }
    }

    Ok(OracleOutput { text, csv, stats })
}

fn write_alloc_line(out: &mut String, clock: u64, object: ObjectId, size: u64, site: SiteId, thread: ThreadId) {
    use std::fmt::Write as _;
    let _ = writeln!(out, "t{clock}: alloc(id={object}, size={size}, site={site}, thread={thread})");
}

fn write_free_line(out: &mut String, clock: u64, object: ObjectId, size: u64, site: SiteId, thread: ThreadId) {
    use std::fmt::Write as _;
    let _ = writeln!(out, "t{clock}: free(id={object}, size={size}, site={site}, thread={thread})");
}

fn write_alloc_row(out: &mut String, clock: u64, object: ObjectId, size: u64, site: SiteId, thread: ThreadId, type_id: TypeId) {
    use std::fmt::Write as _;
    let _ = writeln!(out, "{clock},alloc,{object},{size},{site},{thread},{type_id}");
}

fn write_free_row(out: &mut String, clock: u64, object: ObjectId, size: u64, site: SiteId, thread: ThreadId, type_id: TypeId) {
    use std::fmt::Write as _;
    let _ = writeln!(out, "{clock},free,{object},{size},{site},{thread},{type_id}");
}

/// Write `output` to the given writers verbatim; split out so the
/// pipeline can route these through its atomic-rename commit (§5, §7)
/// without the oracle builder knowing about paths.
pub fn write_to(output: &OracleOutput, text_sink: &mut impl Write, csv_sink: &mut impl Write) -> std::io::Result<()> {
    text_sink.write_all(output.text.as_bytes())?;
    csv_sink.write_all(output.csv.as_bytes())?;
    Ok(())
}
