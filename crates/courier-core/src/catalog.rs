//! Static model catalog: small numeric id → gateway model name and its
//! token limit.  Consumed as a read-only lookup table; the token limit is
//! copied onto the user record at selection time, not re-derived later.

pub struct ModelSpec {
    pub id: u32,
    pub name: &'static str,
    pub max_tokens: i64,
}

pub const MODELS: &[ModelSpec] = &[
    ModelSpec { id: 1, name: "openrouter/auto", max_tokens: 128000 },
    ModelSpec { id: 2, name: "nousresearch/nous-capybara-7b", max_tokens: 4096 },
    ModelSpec { id: 3, name: "mistralai/mistral-7b-instruct", max_tokens: 8192 },
    ModelSpec { id: 4, name: "huggingfaceh4/zephyr-7b-beta", max_tokens: 4096 },
    ModelSpec { id: 5, name: "openchat/openchat-7b", max_tokens: 8192 },
    ModelSpec { id: 6, name: "gryphe/mythomist-7b", max_tokens: 32768 },
    ModelSpec { id: 7, name: "openrouter/cinematika-7b", max_tokens: 8000 },
    ModelSpec { id: 8, name: "rwkv/rwkv-5-world-3b", max_tokens: 10000 },
    ModelSpec { id: 9, name: "recursal/rwkv-5-3b-ai-town", max_tokens: 10000 },
    ModelSpec { id: 10, name: "recursal/eagle-7b", max_tokens: 10000 },
    ModelSpec { id: 11, name: "jondurbin/bagel-34b", max_tokens: 8000 },
    ModelSpec { id: 12, name: "jebcarter/psyfighter-13b", max_tokens: 4096 },
    ModelSpec { id: 13, name: "koboldai/psyfighter-13b-2", max_tokens: 4096 },
    ModelSpec { id: 14, name: "neversleep/noromaid-mixtral-8x7b-instruct", max_tokens: 8000 },
    ModelSpec { id: 15, name: "nousresearch/nous-hermes-llama2-13b", max_tokens: 4096 },
    ModelSpec { id: 16, name: "meta-llama/codellama-34b-instruct", max_tokens: 8192 },
    ModelSpec { id: 17, name: "phind/phind-codellama-34b", max_tokens: 4096 },
    ModelSpec { id: 18, name: "intel/neural-chat-7b", max_tokens: 4096 },
    ModelSpec { id: 19, name: "nousresearch/nous-hermes-2-mixtral-8x7b-dpo", max_tokens: 32000 },
    ModelSpec { id: 20, name: "nousresearch/nous-hermes-2-mixtral-8x7b-sft", max_tokens: 32000 },
    ModelSpec { id: 21, name: "haotian-liu/llava-13b", max_tokens: 2048 },
    ModelSpec { id: 22, name: "nousresearch/nous-hermes-2-vision-7b", max_tokens: 4096 },
    ModelSpec { id: 23, name: "meta-llama/llama-2-13b-chat", max_tokens: 4096 },
    ModelSpec { id: 24, name: "gryphe/mythomax-l2-13b", max_tokens: 4096 },
    ModelSpec { id: 25, name: "nousresearch/nous-hermes-llama2-70b", max_tokens: 4096 },
    ModelSpec { id: 26, name: "teknium/openhermes-2-mistral-7b", max_tokens: 4096 },
    ModelSpec { id: 27, name: "teknium/openhermes-2.5-mistral-7b", max_tokens: 4096 },
    ModelSpec { id: 28, name: "undi95/remm-slerp-l2-13b", max_tokens: 4096 },
    ModelSpec { id: 29, name: "undi95/toppy-m-7b", max_tokens: 4096 },
    ModelSpec { id: 30, name: "01-ai/yi-34b-chat", max_tokens: 4096 },
    ModelSpec { id: 31, name: "01-ai/yi-6b", max_tokens: 4096 },
    ModelSpec { id: 32, name: "togethercomputer/stripedhyena-nous-7b", max_tokens: 32768 },
    ModelSpec { id: 33, name: "togethercomputer/stripedhyena-hessian-7b", max_tokens: 32768 },
    ModelSpec { id: 34, name: "mistralai/mixtral-8x7b", max_tokens: 32768 },
    ModelSpec { id: 35, name: "nousresearch/nous-hermes-yi-34b", max_tokens: 4096 },
    ModelSpec { id: 36, name: "open-orca/mistral-7b-openorca", max_tokens: 8192 },
    ModelSpec { id: 37, name: "openai/gpt-3.5-turbo", max_tokens: 4095 },
    ModelSpec { id: 38, name: "openai/gpt-3.5-turbo-16k", max_tokens: 16385 },
    ModelSpec { id: 39, name: "openai/gpt-4-turbo-preview", max_tokens: 128000 },
    ModelSpec { id: 40, name: "openai/gpt-4", max_tokens: 8191 },
    ModelSpec { id: 41, name: "openai/gpt-4-32k", max_tokens: 32767 },
    ModelSpec { id: 42, name: "openai/gpt-4-vision-preview", max_tokens: 128000 },
    ModelSpec { id: 43, name: "openai/gpt-3.5-turbo-instruct", max_tokens: 4095 },
    ModelSpec { id: 44, name: "google/palm-2-chat-bison", max_tokens: 36864 },
    ModelSpec { id: 45, name: "google/palm-2-codechat-bison", max_tokens: 28672 },
    ModelSpec { id: 46, name: "google/palm-2-chat-bison-32k", max_tokens: 131072 },
    ModelSpec { id: 47, name: "google/palm-2-codechat-bison-32k", max_tokens: 131072 },
    ModelSpec { id: 48, name: "google/gemini-pro", max_tokens: 131040 },
    ModelSpec { id: 49, name: "google/gemini-pro-vision", max_tokens: 65536 },
    ModelSpec { id: 50, name: "perplexity/pplx-70b-online", max_tokens: 4096 },
    ModelSpec { id: 51, name: "perplexity/pplx-7b-online", max_tokens: 4096 },
    ModelSpec { id: 52, name: "perplexity/pplx-7b-chat", max_tokens: 8192 },
    ModelSpec { id: 53, name: "perplexity/pplx-70b-chat", max_tokens: 4096 },
    ModelSpec { id: 54, name: "meta-llama/llama-2-70b-chat", max_tokens: 4096 },
    ModelSpec { id: 55, name: "nousresearch/nous-capybara-34b", max_tokens: 32768 },
    ModelSpec { id: 56, name: "jondurbin/airoboros-l2-70b", max_tokens: 4096 },
    ModelSpec { id: 57, name: "austism/chronos-hermes-13b", max_tokens: 4096 },
    ModelSpec { id: 58, name: "migtissera/synthia-70b", max_tokens: 8192 },
    ModelSpec { id: 59, name: "pygmalionai/mythalion-13b", max_tokens: 8192 },
    ModelSpec { id: 60, name: "undi95/remm-slerp-l2-13b-6k", max_tokens: 6144 },
    ModelSpec { id: 61, name: "xwin-lm/xwin-lm-70b", max_tokens: 8192 },
    ModelSpec { id: 62, name: "gryphe/mythomax-l2-13b-8k", max_tokens: 8192 },
    ModelSpec { id: 63, name: "alpindale/goliath-120b", max_tokens: 6144 },
    ModelSpec { id: 64, name: "lizpreciatior/lzlv-70b-fp16-hf", max_tokens: 4096 },
    ModelSpec { id: 65, name: "neversleep/noromaid-20b", max_tokens: 8192 },
    ModelSpec { id: 66, name: "mistralai/mixtral-8x7b-instruct", max_tokens: 32768 },
    ModelSpec { id: 67, name: "cognitivecomputations/dolphin-mixtral-8x7b", max_tokens: 32000 },
    ModelSpec { id: 68, name: "anthropic/claude-2", max_tokens: 200000 },
    ModelSpec { id: 69, name: "anthropic/claude-2.0", max_tokens: 100000 },
    ModelSpec { id: 70, name: "anthropic/claude-instant-v1", max_tokens: 100000 },
    ModelSpec { id: 71, name: "mancer/weaver", max_tokens: 8000 },
    ModelSpec { id: 72, name: "mistralai/mistral-tiny", max_tokens: 32000 },
    ModelSpec { id: 73, name: "mistralai/mistral-small", max_tokens: 32000 },
    ModelSpec { id: 74, name: "mistralai/mistral-medium", max_tokens: 32000 },
];

pub fn get(id: u32) -> Option<&'static ModelSpec> {
    MODELS.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_in_range() {
        let spec = get(3).unwrap();
        assert_eq!(spec.name, "mistralai/mistral-7b-instruct");
        assert_eq!(spec.max_tokens, 8192);
    }

    #[test]
    fn lookup_out_of_range() {
        assert!(get(0).is_none());
        assert!(get(75).is_none());
    }

    #[test]
    fn ids_are_unique_and_ordered() {
        for pair in MODELS.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
    }
}
