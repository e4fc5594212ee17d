//! 로그 수집기 -- 로그 소스를 순서대로 읽어 쿼리 관측 목록을 만듭니다.
//!
//! 각 라인은 [`LineExtractor`]로 추출하고, 매치되면 [`ResultProbe`]로
//! 결과 존재 여부를 확인합니다. 출력 순서는 입력 라인 순서와 같습니다.
//!
//! 라인은 원시 바이트로 읽습니다. 액세스 로그에는 UTF-8이 아닌 경로나
//! User-Agent가 섞일 수 있으며, 그런 라인도 패턴이 없으면 그냥 건너뜁니다.
//!
//! # 실패 처리
//! 읽기, 디코딩, 조회 중 하나라도 실패하면 그 즉시 전체 수집이 중단되고
//! 부분 결과는 버려집니다.

use std::path::Path;

use metrics::counter;
use serde::Serialize;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use querytally_core::error::LogReadError;
use querytally_core::metrics::{INGEST_LINES_READ_TOTAL, INGEST_QUERIES_EXTRACTED_TOTAL};
use querytally_core::pipeline::ResultProbe;
use querytally_core::types::QueryObservation;

use crate::error::IngestError;
use crate::extractor::LineExtractor;

/// 수집 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// 읽은 라인 수
    pub lines_read: usize,
    /// 쿼리가 추출된 라인 수
    pub queries_extracted: usize,
}

/// 수집 결과
#[derive(Debug, Clone, Default)]
pub struct Ingestion {
    /// 입력 순서대로 정렬된 관측
    pub observations: Vec<QueryObservation>,
    pub summary: IngestSummary,
}

/// 로그 수집기
pub struct LogIngester<P> {
    extractor: LineExtractor,
    probe: P,
}

impl<P: ResultProbe> LogIngester<P> {
    /// 추출기와 결과 확인기로 수집기를 생성합니다.
    pub fn new(extractor: LineExtractor, probe: P) -> Self {
        Self { extractor, probe }
    }

    /// 사용 중인 결과 확인기
    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// 로그 파일을 열어 수집합니다.
    pub async fn ingest_file(&self, path: &Path) -> Result<Ingestion, IngestError> {
        let source_name = path.display().to_string();
        let file = File::open(path).await.map_err(|source| LogReadError::Open {
            path: source_name.clone(),
            source,
        })?;
        self.ingest(BufReader::new(file), &source_name).await
    }

    /// 임의의 라인 소스에서 수집합니다.
    ///
    /// `source_name`은 에러 메시지와 로그에 쓰입니다.
    pub async fn ingest<R>(&self, reader: R, source_name: &str) -> Result<Ingestion, IngestError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.split(b'\n');
        let mut ingestion = Ingestion::default();

        loop {
            let line_no = ingestion.summary.lines_read + 1;
            let next = lines
                .next_segment()
                .await
                .map_err(|source| LogReadError::Read {
                    path: source_name.to_owned(),
                    line: line_no,
                    source,
                })?;
            let Some(mut line) = next else {
                break;
            };
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            ingestion.summary.lines_read = line_no;
            counter!(INGEST_LINES_READ_TOTAL).increment(1);

            let query = match self.extractor.extract_bytes(&line) {
                Ok(Some(query)) => query,
                Ok(None) => continue,
                Err(source) => {
                    return Err(IngestError::Decode {
                        line: line_no,
                        source,
                    });
                }
            };
            ingestion.summary.queries_extracted += 1;
            counter!(INGEST_QUERIES_EXTRACTED_TOTAL).increment(1);

            let has_results =
                self.probe
                    .has_results(&query)
                    .await
                    .map_err(|source| IngestError::Backend {
                        line: line_no,
                        source,
                    })?;
            debug!(line = line_no, query = %query, has_results, "query observed");
            ingestion
                .observations
                .push(QueryObservation::new(query, has_results));
        }

        info!(
            source = source_name,
            handler = self.extractor.handler_path(),
            lines_read = ingestion.summary.lines_read,
            queries = ingestion.summary.queries_extracted,
            "log ingested"
        );
        Ok(ingestion)
    }
}
