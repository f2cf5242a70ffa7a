//! Fixed C fragments of the generated predictor
//!
//! Only the constants, tables and tree/vote functions vary between models;
//! everything here is emitted verbatim.

pub const INCLUDES: &str = "\
#include <stdint.h>
#include <stdio.h>
#include <string.h>
";

pub const TYPEDEFS: &str = "\
typedef struct {
    const char* term;
    int feature_index;
} FeatureEntry;

typedef struct {
    int indices[BUCKET_CAPACITY];
    int count;
} HashBucket;
";

/// FNV-1a over the NUL-terminated term, reduced to a bucket slot.
pub const HASH_STRING: &str = "\
static uint32_t hash_string(const char* str) {
    uint32_t hash = 2166136261u;
    while (*str) {
        hash ^= (uint32_t)(unsigned char)*str;
        hash *= 16777619u;
        str++;
    }
    return hash % HASH_TABLE_SIZE;
}
";

pub const FIND_FEATURE: &str = "\
static int find_feature(const char* term) {
    const HashBucket* bucket = &HASH_BUCKETS[hash_string(term)];
    for (int i = 0; i < bucket->count; i++) {
        const FeatureEntry* entry = &FEATURE_TABLE[bucket->indices[i]];
        if (strcmp(entry->term, term) == 0) {
            return entry->feature_index;
        }
    }
    return -1;
}
";

/// ASCII-only classification, independent of the C locale.
pub const TOKENIZER: &str = "\
static int is_token_byte(unsigned char c) {
    return (c >= '0' && c <= '9') || (c >= 'a' && c <= 'z') || (c >= 'A' && c <= 'Z');
}

static char to_lower_ascii(unsigned char c) {
    return (char)((c >= 'A' && c <= 'Z') ? c + ('a' - 'A') : c);
}

static void extract_features(const char* inputs[NUM_INPUTS], float features[MAX_FEATURES]) {
    char token[TOKEN_BUFFER_SIZE];

    for (int i = 0; i < MAX_FEATURES; i++) {
        features[i] = 0.0f;
    }

    for (int i = 0; i < NUM_INPUTS; i++) {
        const char* p = inputs[i] ? inputs[i] : \"\";
        while (*p) {
            while (*p && !is_token_byte((unsigned char)*p)) {
                p++;
            }
            if (!*p) {
                break;
            }

            size_t len = 0;
            while (*p && is_token_byte((unsigned char)*p) && len < TOKEN_BUFFER_SIZE - 1) {
                token[len++] = to_lower_ascii((unsigned char)*p);
                p++;
            }
            token[len] = '\\0';

            if (len >= MIN_TOKEN_LEN) {
                int idx = find_feature(token);
                if (idx >= 0 && idx < MAX_FEATURES) {
                    features[idx] = 1.0f;
                }
            }
        }
    }
}
";

pub const MAIN: &str = "\
int main(int argc, char* argv[]) {
    static float features[MAX_FEATURES];
    const char* inputs[NUM_INPUTS];

    if (argc < NUM_INPUTS + 1) {
        fprintf(stderr, \"Warning: expected %d arguments, got %d; missing inputs are empty\\n\",
                NUM_INPUTS, argc - 1);
    }
    for (int i = 0; i < NUM_INPUTS; i++) {
        inputs[i] = (i + 1 < argc) ? argv[i + 1] : \"\";
    }

    extract_features(inputs, features);
    int service_id = predict_service(features);
    int activity_id = predict_activity(features);
    printf(\"{\\\"service_id\\\":%d,\\\"activity_id\\\":%d}\\n\", service_id, activity_id);
    return 0;
}
";
