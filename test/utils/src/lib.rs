/// A `GET /v1/threads/{id}/messages` payload as the service returns it, newest
/// message first. The newest assistant message leads with an image block so
/// callers have to skip to the first text block.
pub fn message_list_fixture() -> &'static str {
    return r#"
{
  "object": "list",
  "data": [
    {
      "id": "msg_003",
      "object": "thread.message",
      "thread_id": "thread_abc",
      "role": "assistant",
      "content": [
        {
          "type": "image_file",
          "image_file": { "file_id": "file_001" }
        },
        {
          "type": "text",
          "text": { "value": "Our stores open at 9am.", "annotations": [] }
        },
        {
          "type": "text",
          "text": { "value": "Anything else?", "annotations": [] }
        }
      ]
    },
    {
      "id": "msg_002",
      "object": "thread.message",
      "thread_id": "thread_abc",
      "role": "user",
      "content": [
        {
          "type": "text",
          "text": { "value": "When do you open?", "annotations": [] }
        }
      ]
    },
    {
      "id": "msg_001",
      "object": "thread.message",
      "thread_id": "thread_abc",
      "role": "assistant",
      "content": [
        {
          "type": "text",
          "text": { "value": "An older reply.", "annotations": [] }
        }
      ]
    }
  ],
  "first_id": "msg_003",
  "last_id": "msg_001",
  "has_more": false
}
"#
    .trim();
}
