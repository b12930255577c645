//! Property tests for the text parsers

use hostpulse_core::monitoring::parser::tables::{parse_df_table, parse_net_dev_table};
use hostpulse_core::monitoring::{DistroInfo, IdentitySeed, TransportKind, parser_for};
use proptest::prelude::*;

fn seed() -> IdentitySeed {
    IdentitySeed {
        host: "10.1.1.1".into(),
        hostname: "seed-host".into(),
        distro: DistroInfo::new("debian", "12"),
    }
}

fn transport_strategy() -> impl Strategy<Value = TransportKind> {
    prop_oneof![Just(TransportKind::Direct), Just(TransportKind::Bastion)]
}

proptest! {
    /// Property: parsing is a pure function of its input
    #[test]
    fn parse_is_idempotent(kind in transport_strategy(), text in "(?s).{0,400}") {
        let parser = parser_for(kind);
        prop_assert_eq!(parser.transport(), kind);
        prop_assert_eq!(parser.parse(&text, &seed()), parser.parse(&text, &seed()));
    }

    /// Property: arbitrary text never produces an empty identity
    #[test]
    fn identity_fields_never_empty(kind in transport_strategy(), text in "(?s).{0,400}") {
        let stats = parser_for(kind).parse(&text, &seed());
        prop_assert!(!stats.hostname.is_empty());
        prop_assert!(!stats.ip.is_empty());
    }

    /// Property: the cpu line is recovered whatever surrounds it
    #[test]
    fn cpu_line_found_anywhere(
        kind in transport_strategy(),
        fields in prop::array::uniform8(0u64..10_000_000),
        before in "[d-z ]{0,40}",
        after in "[d-z ]{0,40}",
    ) {
        let cpu_line = format!(
            "cpu  {} {} {} {} {} {} {} {}",
            fields[0], fields[1], fields[2], fields[3],
            fields[4], fields[5], fields[6], fields[7]
        );
        let text = format!("{before}\n{cpu_line}\n{after}\n");
        let cpu = parser_for(kind).parse(&text, &seed()).cpu;
        prop_assert_eq!(cpu.map(|c| c.user), Some(fields[0]));
    }

    /// Property: df percentages are carried over verbatim
    #[test]
    fn df_rows_keep_percentages(
        rows in prop::collection::vec(("[a-z]{1,8}", 0i64..=100), 1..6),
    ) {
        let lines: Vec<String> = rows
            .iter()
            .map(|(mount, pct)| format!("/dev/sd{mount} 1000 500 500 {pct}% /{mount}"))
            .collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let disks = parse_df_table(&refs);

        prop_assert_eq!(disks.len(), rows.len());
        for (disk, (mount, pct)) in disks.iter().zip(&rows) {
            prop_assert_eq!(&disk.filesystem, &format!("/{mount}"));
            prop_assert_eq!(disk.used_percent, *pct);
        }
    }

    /// Property: net/dev totals are the sums of non-loopback interfaces
    #[test]
    fn net_dev_sums_interfaces(
        ifaces in prop::collection::vec((0u64..1_000_000_000, 0u64..1_000_000_000), 1..5),
        lo in (0u64..1_000_000, 0u64..1_000_000),
    ) {
        let mut lines = vec![
            "Inter-|   Receive                                                |  Transmit".to_string(),
            " face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed".to_string(),
            format!("    lo: {} 0 0 0 0 0 0 0 {} 0 0 0 0 0 0 0", lo.0, lo.1),
        ];
        for (i, (rx, tx)) in ifaces.iter().enumerate() {
            lines.push(format!("  eth{i}: {rx} 0 0 0 0 0 0 0 {tx} 0 0 0 0 0 0 0"));
        }
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let sample = parse_net_dev_table(&refs).unwrap();

        prop_assert_eq!(sample.rx_bytes, ifaces.iter().map(|i| i.0).sum::<u64>());
        prop_assert_eq!(sample.tx_bytes, ifaces.iter().map(|i| i.1).sum::<u64>());
    }
}
