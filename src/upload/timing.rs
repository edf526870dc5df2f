use std::{
    future::Future,
    time::{Duration, Instant},
};

/// Wall-clock time one phase of the run took, shown in the summary as seconds with millisecond
/// precision, e.g. "1.250s"
#[derive(Clone, Copy, Debug)]
pub(crate) struct RunTime(Duration);

impl RunTime {
    pub(crate) fn since_start(start: Instant) -> Self {
        Self(start.elapsed())
    }
}

impl serde::Serialize for RunTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = self.0.as_millis();
        serializer.collect_str(&format_args!("{}.{:03}s", millis / 1000, millis % 1000))
    }
}

/// Awaits the future, measuring how long it took
pub(crate) async fn timed<F: Future>(future: F) -> (F::Output, RunTime) {
    let start = Instant::now();
    let output = future.await;

    (output, RunTime::since_start(start))
}

#[derive(serde::Serialize, Clone, Debug)]
pub(crate) struct RunTimes {
    pub(crate) connect_run_time: RunTime,
    // Absent when connecting to etcd failed and nothing was uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) upload_run_time: Option<RunTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_time_serialization() {
        assert_eq!(
            serde_json::to_string(&RunTime(Duration::from_millis(2_045))).unwrap(),
            "\"2.045s\""
        );
        assert_eq!(
            serde_json::to_string(&RunTime(Duration::from_micros(7_999))).unwrap(),
            "\"0.007s\""
        );
    }

    #[test]
    fn test_run_times_without_upload() {
        let run_times = RunTimes {
            connect_run_time: RunTime(Duration::from_millis(30)),
            upload_run_time: None,
        };

        assert_eq!(
            serde_json::to_value(&run_times).unwrap(),
            serde_json::json!({"connect_run_time": "0.030s"})
        );
    }

    #[tokio::test]
    async fn test_timed() {
        let (output, run_time) = timed(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            42
        })
        .await;

        assert_eq!(output, 42);
        assert!(run_time.0 >= Duration::from_millis(20));
    }
}
