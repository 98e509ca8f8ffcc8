use std::collections::HashMap;

use crate::record::CommandRecord;

/// Keep only the latest record of each distinct command text, oldest first.
///
/// Runs on an already filtered result, so a record dropped by a filter can
/// never stand in for its command. When two records of the same command
/// share a timestamp, the later one in `records` wins.
pub fn dedup_latest(records: Vec<CommandRecord>) -> Vec<CommandRecord> {
    let mut latest: HashMap<String, (usize, CommandRecord)> = HashMap::new();
    for (position, record) in records.into_iter().enumerate() {
        let newer = latest
            .get(&record.command)
            .is_none_or(|(_, kept)| kept.command_dt <= record.command_dt);
        if newer {
            latest.insert(record.command.clone(), (position, record));
        }
    }

    let mut survivors: Vec<(usize, CommandRecord)> = latest.into_values().collect();
    survivors.sort_by(|(pa, a), (pb, b)| a.command_dt.cmp(&b.command_dt).then(pa.cmp(pb)));
    survivors.into_iter().map(|(_, record)| record).collect()
}
