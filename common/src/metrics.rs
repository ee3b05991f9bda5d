use metrics::{describe_gauge, gauge};

pub fn component_info_metric(name: &'static str) {
    static NAME: &str = "tirf_toolkit_component_info";

    describe_gauge!(NAME, "Basic information about the component");

    let git_rev = option_env!("GIT_VERSION").unwrap_or("unknown");
    gauge!(NAME, "component" => name, "git_version" => git_rev).set(1);
}

pub mod names {
    use const_format::concatcp;

    pub const METRIC_NAME_PREFIX: &str = "tirf_toolkit_";

    pub const FAILURES: &str = concatcp!(METRIC_NAME_PREFIX, "failures");
    pub const FILES_PROCESSED: &str = concatcp!(METRIC_NAME_PREFIX, "files_processed");
    pub const TRANSITIONS_DETECTED: &str = concatcp!(METRIC_NAME_PREFIX, "transitions_detected");
}

pub mod transitions_detected {
    #[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
    pub enum EdgeKind {
        Front,
        Back,
    }

    // Label building function
    pub fn get_label(edge_kind: EdgeKind) -> (&'static str, &'static str) {
        (
            "edge_kind",
            match edge_kind {
                EdgeKind::Front => "front",
                EdgeKind::Back => "back",
            },
        )
    }
}

pub mod failures {
    #[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
    pub enum FailureKind {
        AnalysisDegraded,
        AnalysisFailed,
        FileReadFailed,
        FileWriteFailed,
        PlotFailed,
    }

    // Label building function
    pub fn get_label(failure_kind: FailureKind) -> (&'static str, &'static str) {
        (
            "failure_kind",
            match failure_kind {
                FailureKind::AnalysisDegraded => "analysis_degraded",
                FailureKind::AnalysisFailed => "analysis_failed",
                FailureKind::FileReadFailed => "file_read_failed",
                FailureKind::FileWriteFailed => "file_write_failed",
                FailureKind::PlotFailed => "plot_failed",
            },
        )
    }
}
