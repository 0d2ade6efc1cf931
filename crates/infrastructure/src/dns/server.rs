//! DNS server frontend: bridges `hickory-server` requests into the query
//! pipeline and assembles wire responses from pipeline messages.

use crate::dns::codec::RecordTypeMapper;
use crate::dns::pipeline::{PipelineRequest, QueryPipeline};
use async_trait::async_trait;
use hickory_proto::op::{Edns, Header, ResponseCode};
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::proto::xfer::Protocol;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use warden_dns_domain::{ClientInfo, QueryClass, RecordType, Transport};

pub struct DnsServerHandler {
    pipeline: Arc<QueryPipeline>,
    shutdown: CancellationToken,
}

impl DnsServerHandler {
    pub fn new(pipeline: Arc<QueryPipeline>, shutdown: CancellationToken) -> Self {
        Self { pipeline, shutdown }
    }

    fn transport(protocol: Protocol) -> Transport {
        match protocol {
            Protocol::Tcp => Transport::Tcp,
            Protocol::Https => Transport::Doh,
            _ => Transport::Udp,
        }
    }

    fn pipeline_request(request: &Request) -> PipelineRequest {
        let queries = request.queries();
        let (name, record_type, class) = match queries.first() {
            Some(query) => (
                query.name().to_string(),
                RecordTypeMapper::from_wire(query.query_type()),
                QueryClass::from_u16(u16::from(query.query_class())),
            ),
            None => (String::new(), RecordType::A, QueryClass::In),
        };

        PipelineRequest {
            id: request.header().id(),
            question_count: queries.len(),
            name,
            record_type,
            class,
            recursion_desired: request.header().recursion_desired(),
            checking_disabled: request.header().checking_disabled(),
            dnssec_ok: request.edns().is_some_and(|e| e.dnssec_ok()),
            client: ClientInfo::new(request.src().ip(), Self::transport(request.protocol())),
        }
    }
}

#[async_trait]
impl RequestHandler for DnsServerHandler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> ResponseInfo {
        let pipeline_request = Self::pipeline_request(request);
        let cancel = self.shutdown.child_token();

        let outcome = self.pipeline.handle(pipeline_request, cancel).await;

        let message = match outcome.response {
            Some(message) => message,
            None => {
                // Rate limiter asked for a silent drop.
                debug!(client = %request.src(), "Dropping query without response");
                let mut header = Header::response_from_request(request.header());
                header.set_response_code(ResponseCode::Refused);
                return ResponseInfo::from(header);
            }
        };

        let mut header = Header::response_from_request(request.header());
        header.set_response_code(message.response_code());
        header.set_authoritative(message.authoritative());
        header.set_recursion_available(true);

        let builder = MessageResponseBuilder::from_message_request(request);
        let mut response = builder.build(
            header,
            message.answers().iter(),
            message.name_servers().iter(),
            std::iter::empty(),
            message.additionals().iter(),
        );

        if let Some(request_edns) = request.edns() {
            // EDNS echo: advertise our payload size and hand the DO bit
            // back as received. No validation happens here.
            let mut edns = Edns::new();
            edns.set_max_payload(4096);
            edns.set_version(0);
            edns.set_dnssec_ok(request_edns.dnssec_ok());
            response.set_edns(edns);
        }

        match response_handle.send_response(response).await {
            Ok(info) => info,
            Err(e) => {
                warn!(client = %request.src(), error = %e, "Failed to send DNS response");
                let mut header = Header::response_from_request(request.header());
                header.set_response_code(ResponseCode::ServFail);
                ResponseInfo::from(header)
            }
        }
    }
}
